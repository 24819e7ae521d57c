//! Reusable text widgets.
//!
//! Pure functions that turn data into styled lines. No state mutation
//! happens here.

use super::text::{display_width, pad_to, truncate};
use super::theme::Theme;

pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn spinner(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

/// Title line with an optional "Step n of m" suffix.
pub fn title_line(theme: &Theme, title: &str, position: Option<(usize, usize)>) -> String {
    let mut line = Theme::paint(theme.title, title);
    if let Some((current, total)) = position {
        line.push_str("  ");
        line.push_str(&Theme::paint(
            theme.muted,
            format!("Step {current} of {total}"),
        ));
    }
    line
}

/// Help footer listing key bindings.
pub fn help_line(theme: &Theme, bindings: &[(&str, &str)]) -> String {
    let text = bindings
        .iter()
        .map(|(key, action)| format!("{key} {action}"))
        .collect::<Vec<_>>()
        .join(" · ");
    Theme::paint(theme.muted, text)
}

pub fn error_banner(theme: &Theme, message: &str) -> String {
    Theme::paint(theme.error, format!("✗ {message}"))
}

pub fn warning_banner(theme: &Theme, message: &str) -> String {
    Theme::paint(theme.warning, format!("! {message}"))
}

pub fn success_banner(theme: &Theme, message: &str) -> String {
    Theme::paint(theme.success, format!("✓ {message}"))
}

/// Cursor-terminated input field.
pub fn input_field(theme: &Theme, value: &str, placeholder: &str) -> String {
    let body = if value.is_empty() {
        Theme::paint(theme.muted, placeholder)
    } else {
        value.to_string()
    };
    format!("{} {body}{}", Theme::paint(theme.accent, ">"), Theme::paint(theme.selected, " "))
}

/// Selectable row with a cursor marker.
pub fn choice_row(theme: &Theme, label: &str, selected: bool) -> String {
    if selected {
        format!(
            "{} {}",
            Theme::paint(theme.accent, "›"),
            Theme::paint(theme.selected, label)
        )
    } else {
        format!("  {label}")
    }
}

/// Draw a rounded border around `lines`, padding every row to one width.
pub fn boxed(theme: &Theme, title: Option<&str>, lines: &[String]) -> String {
    let title_width = title.map(|t| display_width(t) + 2).unwrap_or(0);
    let inner = lines
        .iter()
        .map(|line| display_width(line))
        .max()
        .unwrap_or(0)
        .max(title_width);

    let mut top = String::from("╭");
    match title {
        Some(title) => {
            top.push(' ');
            top.push_str(title);
            top.push(' ');
            top.push_str(&"─".repeat(inner + 2 - title_width));
        }
        None => top.push_str(&"─".repeat(inner + 2)),
    }
    top.push('╮');

    let mut out = vec![Theme::paint(theme.border, top)];
    for line in lines {
        out.push(format!(
            "{} {} {}",
            Theme::paint(theme.border, "│"),
            pad_to(line, inner),
            Theme::paint(theme.border, "│")
        ));
    }
    out.push(Theme::paint(
        theme.border,
        format!("╰{}╯", "─".repeat(inner + 2)),
    ));
    out.join("\n")
}

/// Clip or pad a list of lines to exactly `height` rows of at most `width` cells.
pub fn fit_frame(lines: Vec<String>, width: usize, height: usize) -> String {
    let mut rows: Vec<String> = lines
        .into_iter()
        .flat_map(|line| line.split('\n').map(str::to_string).collect::<Vec<_>>())
        .map(|line| truncate(&line, width))
        .collect();
    rows.truncate(height);
    while rows.len() < height {
        rows.push(String::new());
    }
    rows.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{boxed, fit_frame, spinner, title_line};
    use crate::ui::text::display_width;
    use crate::ui::theme::Theme;

    #[test]
    fn boxed_rows_share_one_width() {
        let theme = Theme::plain();
        let block = boxed(
            &theme,
            Some("Hooks"),
            &["short".to_string(), "a much longer line".to_string()],
        );
        let widths: Vec<usize> = block.lines().map(display_width).collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
        assert!(block.starts_with("╭ Hooks ─"));
    }

    #[test]
    fn fit_frame_pads_and_clips() {
        let frame = fit_frame(vec!["one".to_string(), "two\nthree".to_string()], 4, 5);
        let rows: Vec<&str> = frame.split('\n').collect();
        assert_eq!(rows, vec!["one", "two", "thr…", "", ""]);
        let clipped = fit_frame(vec!["a".into(), "b".into(), "c".into()], 4, 2);
        assert_eq!(clipped, "a\nb");
    }

    #[test]
    fn title_shows_position() {
        let theme = Theme::plain();
        assert_eq!(
            title_line(&theme, "New worktree", Some((2, 4))),
            "New worktree  Step 2 of 4"
        );
    }

    #[test]
    fn spinner_wraps() {
        assert_eq!(spinner(0), spinner(10));
    }
}

//! Frame composition.
//!
//! The active view renders its body as styled text, the status line is
//! appended below it, and the approval modal is composited on top when
//! it is visible. The resulting string is handed to ratatui as one
//! paragraph.

use ansi_to_tui::IntoText;
use ratatui::text::Text;
use ratatui::widgets::Paragraph;

use crate::ui::composite;
use crate::ui::text::truncate;
use crate::ui::theme::Theme;
use crate::ui::widgets::{error_banner, spinner, success_banner};

use super::state::{App, Banner, HookPhase};

/// Draw the current frame.
pub fn render(app: &App, frame: &mut ratatui::Frame) {
    let screen = render_frame(app);
    let text = screen
        .as_bytes()
        .into_text()
        .unwrap_or_else(|_| Text::raw(screen.clone()));
    frame.render_widget(Paragraph::new(text), frame.area());
}

/// The full screen as newline-joined styled text.
pub fn render_frame(app: &App) -> String {
    let width = usize::from(app.width);
    let height = usize::from(app.height);
    let mut screen = app.view.render(&app.theme, width, app.body_height());
    if height > 0 {
        if !screen.is_empty() {
            screen.push('\n');
        }
        screen.push_str(&truncate(&status_line(app), width));
    }

    match &app.hooks {
        HookPhase::PendingApproval(state) if state.visible => {
            composite(&screen, &state.render(&app.theme), width, height)
        }
        _ => screen,
    }
}

fn status_line(app: &App) -> String {
    if let HookPhase::Running { kind, .. } = &app.hooks {
        return format!(
            "{} Running {kind} hooks…",
            Theme::paint(app.theme.accent, spinner(app.frame))
        );
    }
    if let HookPhase::Suspended { kind, .. } = &app.hooks {
        return Theme::paint(app.theme.muted, format!("Running {kind} hooks in the terminal…"));
    }
    match &app.banner {
        Some(Banner::Info(message)) => Theme::paint(app.theme.muted, message),
        Some(Banner::Success(message)) => success_banner(&app.theme, message),
        Some(Banner::Error(message)) => error_banner(&app.theme, message),
        None => String::new(),
    }
}

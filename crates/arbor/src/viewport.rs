//! Scrollable, filterable selection list.
//!
//! A `Viewport` owns the full item sequence plus the filtered view of it.
//! Selection and scroll offset always refer to the filtered view and are
//! re-clamped after every mutation:
//! - `scroll_offset <= max(0, filtered_len - max_visible)`
//! - `selected < filtered_len` whenever the filtered view is non-empty
//!
//! Search mode turns character keys into query edits; leaving it keeps
//! the query as a passive filter.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ui::theme::Theme;
use crate::ui::widgets::input_field;

pub const MIN_VISIBLE: usize = 5;

/// Rows the viewport itself may add around the items: filter label and
/// the two scroll indicators.
pub const VIEWPORT_CHROME: usize = 3;

/// Anything that can be listed and matched against a search query.
pub trait ListItem {
    fn filter_key(&self) -> &str;
}

impl ListItem for String {
    fn filter_key(&self) -> &str {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportAction {
    Moved,
    QueryChanged,
    SearchStarted,
    SearchEnded,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Viewport<T> {
    items: Vec<T>,
    filtered: Vec<usize>,
    scroll_offset: usize,
    selected: usize,
    query: String,
    searching: bool,
    max_visible: usize,
}

impl<T> Default for Viewport<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            filtered: Vec::new(),
            scroll_offset: 0,
            selected: 0,
            query: String::new(),
            searching: false,
            max_visible: MIN_VISIBLE,
        }
    }
}

impl<T: ListItem> Viewport<T> {
    pub fn new(items: Vec<T>) -> Self {
        let mut viewport = Self::default();
        viewport.set_items(items);
        viewport
    }

    /// Replace the underlying items, keeping the selected item if it survives.
    pub fn set_items(&mut self, items: Vec<T>) {
        let previous = self.selected().map(|item| item.filter_key().to_string());
        self.items = items;
        self.refilter(previous.as_deref());
    }

    /// Size the window from the container height minus the caller's chrome.
    pub fn set_container_height(&mut self, height: usize, chrome: usize) {
        self.max_visible = height.saturating_sub(chrome).max(MIN_VISIBLE);
        self.clamp();
    }

    pub fn max_visible(&self) -> usize {
        self.max_visible
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn selected_index(&self) -> Option<usize> {
        if self.filtered.is_empty() {
            None
        } else {
            Some(self.selected)
        }
    }

    pub fn selected(&self) -> Option<&T> {
        let index = *self.filtered.get(self.selected)?;
        self.items.get(index)
    }

    /// Mutable access to the highlighted item. Callers must not change its
    /// filter key.
    pub fn selected_mut(&mut self) -> Option<&mut T> {
        let index = *self.filtered.get(self.selected)?;
        self.items.get_mut(index)
    }

    /// Items currently passing the filter, in original order.
    pub fn filtered(&self) -> impl Iterator<Item = &T> {
        self.filtered.iter().filter_map(|index| self.items.get(*index))
    }

    /// Highlight the first filtered item matching `predicate`.
    pub fn select_where<F>(&mut self, predicate: F) -> bool
    where
        F: Fn(&T) -> bool,
    {
        let found = self
            .filtered
            .iter()
            .position(|index| self.items.get(*index).is_some_and(&predicate));
        match found {
            Some(position) => {
                self.selected = position;
                self.clamp();
                true
            }
            None => false,
        }
    }

    pub fn move_by(&mut self, delta: isize) -> bool {
        if self.filtered.is_empty() {
            return false;
        }
        let last = self.filtered.len() - 1;
        let next = if delta < 0 {
            self.selected.saturating_sub(delta.unsigned_abs())
        } else {
            (self.selected + delta as usize).min(last)
        };
        if next == self.selected {
            return false;
        }
        self.selected = next;
        self.clamp();
        true
    }

    pub fn move_to_start(&mut self) -> bool {
        self.move_by(-(self.selected as isize))
    }

    pub fn move_to_end(&mut self) -> bool {
        self.move_by(self.filtered.len() as isize)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn begin_search(&mut self) {
        self.searching = true;
    }

    pub fn end_search(&mut self) {
        self.searching = false;
    }

    pub fn set_query(&mut self, query: &str) {
        let previous = self.selected().map(|item| item.filter_key().to_string());
        self.query = query.to_string();
        self.refilter(previous.as_deref());
    }

    pub fn push_query(&mut self, ch: char) {
        let mut query = self.query.clone();
        query.push(ch);
        self.set_query(&query);
    }

    pub fn pop_query(&mut self) {
        let mut query = self.query.clone();
        query.pop();
        self.set_query(&query);
    }

    /// Apply a key to the list. Callers handle their own bindings first.
    pub fn handle_key(&mut self, key: &KeyEvent) -> ViewportAction {
        if self.searching {
            return match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    self.end_search();
                    ViewportAction::SearchEnded
                }
                KeyCode::Backspace => {
                    self.pop_query();
                    ViewportAction::QueryChanged
                }
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.push_query(ch);
                    ViewportAction::QueryChanged
                }
                _ => ViewportAction::Ignored,
            };
        }

        let page = self.max_visible.max(1) as isize;
        let moved = match key.code {
            KeyCode::Char('/') => {
                self.begin_search();
                return ViewportAction::SearchStarted;
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_by(1),
            KeyCode::PageUp => self.move_by(-page),
            KeyCode::PageDown => self.move_by(page),
            KeyCode::Home | KeyCode::Char('g') => self.move_to_start(),
            KeyCode::End | KeyCode::Char('G') => self.move_to_end(),
            _ => return ViewportAction::Ignored,
        };
        if moved {
            ViewportAction::Moved
        } else {
            ViewportAction::Ignored
        }
    }

    pub fn hidden_above(&self) -> usize {
        self.scroll_offset
    }

    pub fn hidden_below(&self) -> usize {
        self.filtered
            .len()
            .saturating_sub(self.scroll_offset + self.max_visible)
    }

    /// Render the filter label, scroll indicators and visible rows.
    pub fn render<F>(&self, theme: &Theme, empty_label: &str, row: F) -> Vec<String>
    where
        F: Fn(&T, bool) -> String,
    {
        let mut lines = Vec::new();
        if self.searching {
            lines.push(format!(
                "{} {}",
                Theme::paint(theme.accent, "Search"),
                input_field(theme, &self.query, "type to filter")
            ));
        } else if !self.query.is_empty() {
            lines.push(Theme::paint(
                theme.muted,
                format!("Filter: {} (/ to edit)", self.query),
            ));
        }

        if self.filtered.is_empty() {
            let label = if self.query.is_empty() {
                empty_label.to_string()
            } else {
                format!("No matches for \"{}\"", self.query)
            };
            lines.push(Theme::paint(theme.muted, label));
            return lines;
        }

        let above = self.hidden_above();
        if above > 0 {
            lines.push(Theme::paint(theme.muted, format!("↑ {above} more above")));
        }
        let end = (self.scroll_offset + self.max_visible).min(self.filtered.len());
        for position in self.scroll_offset..end {
            if let Some(item) = self.items.get(self.filtered[position]) {
                lines.push(row(item, position == self.selected));
            }
        }
        let below = self.hidden_below();
        if below > 0 {
            lines.push(Theme::paint(theme.muted, format!("↓ {below} more below")));
        }
        lines
    }

    fn refilter(&mut self, keep: Option<&str>) {
        let needle = self.query.to_lowercase();
        self.filtered = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                needle.is_empty() || item.filter_key().to_lowercase().contains(&needle)
            })
            .map(|(index, _)| index)
            .collect();

        if let Some(key) = keep {
            if let Some(position) = self
                .filtered
                .iter()
                .position(|index| self.items[*index].filter_key() == key)
            {
                self.selected = position;
            }
        }
        self.clamp();
    }

    fn clamp(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            self.selected = 0;
            self.scroll_offset = 0;
            return;
        }
        self.selected = self.selected.min(len - 1);
        let max_offset = len.saturating_sub(self.max_visible);
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + self.max_visible {
            self.scroll_offset = self.selected + 1 - self.max_visible;
        }
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }
}

#[cfg(test)]
mod tests {
    use super::{ListItem, Viewport, ViewportAction, MIN_VISIBLE};
    use crate::ui::theme::Theme;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn numbered(count: usize) -> Vec<String> {
        (0..count).map(|idx| format!("item-{idx:02}")).collect()
    }

    fn assert_invariants<T: ListItem>(viewport: &Viewport<T>) {
        let len = viewport.len();
        assert!(
            viewport.scroll_offset() <= len.saturating_sub(viewport.max_visible()),
            "scroll {} out of range for len {len}",
            viewport.scroll_offset()
        );
        match viewport.selected_index() {
            Some(selected) => {
                assert!(selected < len);
                assert!(selected >= viewport.scroll_offset());
                assert!(selected < viewport.scroll_offset() + viewport.max_visible());
            }
            None => assert_eq!(len, 0),
        }
    }

    #[test]
    fn filter_keeps_original_order() {
        let mut viewport = Viewport::new(names(&["hotfix/1", "feature/x", "fix-2"]));
        viewport.set_query("fix");
        let shown: Vec<&String> = viewport.filtered().collect();
        assert_eq!(shown, vec!["hotfix/1", "fix-2"]);
    }

    #[test]
    fn filter_is_case_insensitive() {
        let mut viewport = Viewport::new(names(&["Main", "develop"]));
        viewport.set_query("MAIN");
        assert_eq!(viewport.len(), 1);
        assert_eq!(viewport.selected().map(String::as_str), Some("Main"));
    }

    #[test]
    fn filter_preserves_selected_item_when_present() {
        let mut viewport = Viewport::new(names(&["alpha", "beta", "gamma", "delta"]));
        viewport.move_by(2);
        assert_eq!(viewport.selected().map(String::as_str), Some("gamma"));
        viewport.set_query("a");
        assert_eq!(viewport.selected().map(String::as_str), Some("gamma"));
        viewport.set_query("ta");
        // gamma no longer matches; the index clamps into the shorter list.
        assert_eq!(viewport.len(), 2);
        assert_eq!(viewport.selected().map(String::as_str), Some("delta"));
    }

    #[test]
    fn window_never_smaller_than_minimum() {
        let mut viewport = Viewport::new(numbered(20));
        viewport.set_container_height(6, 4);
        assert_eq!(viewport.max_visible(), MIN_VISIBLE);
        viewport.set_container_height(40, 4);
        assert_eq!(viewport.max_visible(), 36);
    }

    #[test]
    fn scrolling_moves_minimum_amount() {
        let mut viewport = Viewport::new(numbered(20));
        viewport.set_container_height(5, 0);
        for _ in 0..4 {
            viewport.move_by(1);
        }
        assert_eq!(viewport.scroll_offset(), 0);
        viewport.move_by(1);
        assert_eq!(viewport.scroll_offset(), 1);
        viewport.move_by(-1);
        assert_eq!(viewport.scroll_offset(), 1);
        for _ in 0..4 {
            viewport.move_by(-1);
        }
        assert_eq!(viewport.selected_index(), Some(0));
        assert_eq!(viewport.scroll_offset(), 0);
    }

    #[test]
    fn indicators_report_hidden_rows() {
        let theme = Theme::plain();
        let mut viewport = Viewport::new(numbered(12));
        viewport.set_container_height(5, 0);
        viewport.move_by(6);
        let lines = viewport.render(&theme, "empty", |item, _| item.clone());
        assert_eq!(lines.first().map(String::as_str), Some("↑ 2 more above"));
        assert_eq!(lines.last().map(String::as_str), Some("↓ 5 more below"));
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn search_mode_captures_characters() {
        let mut viewport = Viewport::new(names(&["main", "jobs", "kite"]));
        assert_eq!(
            viewport.handle_key(&key(KeyCode::Char('/'))),
            ViewportAction::SearchStarted
        );
        assert_eq!(
            viewport.handle_key(&key(KeyCode::Char('j'))),
            ViewportAction::QueryChanged
        );
        assert_eq!(viewport.query(), "j");
        assert_eq!(viewport.handle_key(&key(KeyCode::Down)), ViewportAction::Ignored);
        viewport.handle_key(&key(KeyCode::Esc));
        assert!(!viewport.is_searching());
        assert_eq!(viewport.query(), "j");
        assert_eq!(viewport.len(), 1);
        // Outside search mode `j` navigates again.
        viewport.set_query("");
        assert_eq!(viewport.handle_key(&key(KeyCode::Char('j'))), ViewportAction::Moved);
    }

    #[test]
    fn empty_viewport_has_no_selection() {
        let mut viewport: Viewport<String> = Viewport::new(Vec::new());
        assert_eq!(viewport.selected_index(), None);
        assert!(!viewport.move_by(1));
        assert_invariants(&viewport);
    }

    #[test]
    fn invariants_hold_under_mixed_operations() {
        let mut viewport = Viewport::new(numbered(30));
        let mut seed: u64 = 0x9e37_79b9;
        for _ in 0..2_000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            match (seed >> 33) % 8 {
                0 => {
                    viewport.move_by(1);
                }
                1 => {
                    viewport.move_by(-3);
                }
                2 => viewport.push_query(char::from(b'0' + ((seed >> 40) % 10) as u8)),
                3 => viewport.pop_query(),
                4 => {
                    let count = ((seed >> 20) % 40) as usize;
                    viewport.set_items(numbered(count));
                }
                5 => viewport.set_container_height(((seed >> 12) % 30) as usize, 4),
                6 => {
                    viewport.move_to_end();
                }
                _ => viewport.set_query(""),
            }
            assert_invariants(&viewport);
        }
    }
}

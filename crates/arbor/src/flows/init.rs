//! Project initialization wizard: writes `.arbor/config.toml`.
//!
//! `WorktreeDir -> Hooks -> Confirm -> Saving -> Complete`

use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use super::{FlowContext, FLOW_CHROME};
use crate::commands::{Command, Outcome, Route};
use crate::config::{Config, ConfigFile, HooksConfig, DEFAULT_WORKTREE_ROOT};
use crate::hooks::HookKind;
use crate::project::HookSuggestion;
use crate::ui::theme::Theme;
use crate::ui::widgets::{
    choice_row, error_banner, fit_frame, help_line, input_field, spinner, success_banner,
    title_line,
};
use crate::viewport::{Viewport, VIEWPORT_CHROME};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    WorktreeDir,
    Hooks,
    Confirm,
    Saving,
    Complete,
}

const TOTAL_STEPS: usize = 3;

#[derive(Debug, Clone)]
pub struct InitializationState {
    step: InitStep,
    worktree_dir: String,
    dir_error: Option<String>,
    suggestions: Viewport<HookSuggestion>,
    saved: Option<PathBuf>,
    error: Option<String>,
    frame: usize,
}

impl InitializationState {
    pub fn new(config: &Config, suggestions: Vec<HookSuggestion>) -> Self {
        let worktree_dir = if config.worktree.root == Path::new(DEFAULT_WORKTREE_ROOT) {
            String::new()
        } else {
            config.worktree.root.display().to_string()
        };
        Self {
            step: InitStep::WorktreeDir,
            worktree_dir,
            dir_error: None,
            suggestions: Viewport::new(suggestions),
            saved: None,
            error: None,
            frame: 0,
        }
    }

    pub fn step(&self) -> InitStep {
        self.step
    }

    pub fn worktree_dir(&self) -> &str {
        &self.worktree_dir
    }

    pub fn suggestions(&self) -> &Viewport<HookSuggestion> {
        &self.suggestions
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn position(&self) -> Option<(usize, usize)> {
        let current = match self.step {
            InitStep::WorktreeDir => 1,
            InitStep::Hooks => 2,
            InitStep::Confirm => 3,
            InitStep::Saving | InitStep::Complete => return None,
        };
        Some((current, TOTAL_STEPS))
    }

    /// The file this flow writes, built from the current choices.
    pub fn config_file(&self) -> ConfigFile {
        let mut hooks = HooksConfig::default();
        for suggestion in self.suggestions.items().iter().filter(|s| s.enabled) {
            let hook = suggestion.hook();
            match suggestion.kind {
                HookKind::PostCreate => hooks.post_create.push(hook),
                HookKind::PostRemove => hooks.post_remove.push(hook),
            }
        }
        let root = self.worktree_dir.trim();
        let root = (!root.is_empty()).then(|| root.to_string());
        ConfigFile::new(root, &hooks)
    }

    pub fn handle_key(mut self, key: &KeyEvent, _ctx: &FlowContext<'_>) -> (Self, Option<Command>) {
        match self.step {
            InitStep::WorktreeDir => match key.code {
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.worktree_dir.push(ch);
                    self.validate_dir();
                    (self, None)
                }
                KeyCode::Backspace => {
                    self.worktree_dir.pop();
                    self.validate_dir();
                    (self, None)
                }
                KeyCode::Enter => {
                    // An empty buffer keeps the default root.
                    if self.dir_error.is_none() {
                        self.step = InitStep::Hooks;
                    }
                    (self, None)
                }
                KeyCode::Esc => (self, Some(Command::Open(Route::Dashboard))),
                _ => (self, None),
            },
            InitStep::Hooks => {
                if self.suggestions.is_searching() {
                    self.suggestions.handle_key(key);
                    return (self, None);
                }
                match key.code {
                    KeyCode::Char(' ') => {
                        if let Some(suggestion) = self.suggestions.selected_mut() {
                            suggestion.enabled = !suggestion.enabled;
                        }
                    }
                    KeyCode::Tab => {
                        if let Some(suggestion) = self.suggestions.selected_mut() {
                            suggestion.kind = suggestion.kind.next();
                        }
                    }
                    KeyCode::Enter => self.step = InitStep::Confirm,
                    KeyCode::Esc => self.step = InitStep::WorktreeDir,
                    _ => {
                        self.suggestions.handle_key(key);
                    }
                }
                (self, None)
            }
            InitStep::Confirm => match key.code {
                KeyCode::Enter | KeyCode::Char('y') => {
                    self.error = None;
                    self.step = InitStep::Saving;
                    let file = self.config_file();
                    (self, Some(Command::SaveProjectConfig(file)))
                }
                KeyCode::Esc => {
                    self.step = InitStep::Hooks;
                    (self, None)
                }
                _ => (self, None),
            },
            InitStep::Saving => (self, None),
            InitStep::Complete => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => {
                    (self, Some(Command::Open(Route::Dashboard)))
                }
                _ => (self, None),
            },
        }
    }

    fn validate_dir(&mut self) {
        self.dir_error = self
            .worktree_dir
            .chars()
            .any(char::is_control)
            .then(|| "Control characters are not allowed.".to_string());
    }

    pub fn handle_outcome(
        mut self,
        outcome: Outcome,
        _ctx: &FlowContext<'_>,
    ) -> (Self, Option<Command>) {
        match outcome {
            Outcome::ConfigSaved(result) if self.step == InitStep::Saving => match result {
                Ok(path) => {
                    self.step = InitStep::Complete;
                    self.saved = Some(path);
                    (self, Some(Command::ReloadConfig))
                }
                Err(err) => {
                    self.step = InitStep::Confirm;
                    self.error = Some(err.to_string());
                    (self, None)
                }
            },
            other @ (Outcome::ConfigSaved(_)
            | Outcome::Worktrees(_)
            | Outcome::Branches(_)
            | Outcome::WorktreeCreated(_)
            | Outcome::WorktreeRemoved { .. }
            | Outcome::HooksFinished(_)) => {
                debug!(outcome = other.label(), step = ?self.step, "init flow ignores outcome");
                (self, None)
            }
        }
    }

    pub fn tick(&mut self) {
        if self.step == InitStep::Saving {
            self.frame = self.frame.wrapping_add(1);
        }
    }

    pub fn resize(&mut self, height: usize) {
        self.suggestions
            .set_container_height(height.saturating_sub(FLOW_CHROME + 1), VIEWPORT_CHROME);
    }

    pub fn render(&self, theme: &Theme, width: usize, height: usize) -> String {
        let mut lines = vec![
            title_line(theme, "Initialize project", self.position()),
            String::new(),
        ];
        match self.step {
            InitStep::WorktreeDir => {
                lines.push("Where should new worktrees live?".to_string());
                lines.push(input_field(
                    theme,
                    &self.worktree_dir,
                    &format!("default: {DEFAULT_WORKTREE_ROOT}"),
                ));
                lines.push(Theme::paint(
                    theme.muted,
                    "Relative paths start at the repository root.",
                ));
                if let Some(error) = &self.dir_error {
                    lines.push(error_banner(theme, error));
                }
            }
            InitStep::Hooks => {
                lines.push("Hooks to run (space toggles, tab switches hook)".to_string());
                lines.extend(self.suggestions.render(
                    theme,
                    "No setup commands detected.",
                    |suggestion, selected| choice_row(theme, &suggestion_row(suggestion), selected),
                ));
            }
            InitStep::Confirm => {
                lines.push("Write .arbor/config.toml:".to_string());
                lines.push(String::new());
                match toml::to_string_pretty(&self.config_file()) {
                    Ok(preview) if preview.trim().is_empty() => {
                        lines.push(Theme::paint(theme.muted, "  (empty, defaults apply)"));
                    }
                    Ok(preview) => {
                        lines.extend(preview.lines().map(|line| format!("  {line}")));
                    }
                    Err(err) => lines.push(error_banner(theme, &err.to_string())),
                }
            }
            InitStep::Saving => {
                lines.push(format!("{} Saving configuration…", spinner(self.frame)));
            }
            InitStep::Complete => {
                let path = self
                    .saved
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                lines.push(success_banner(theme, &format!("Saved {path}")));
            }
        }

        lines.push(String::new());
        if let Some(error) = &self.error {
            lines.push(error_banner(theme, error));
        }
        let bindings: &[(&str, &str)] = match self.step {
            InitStep::Hooks if self.suggestions.is_searching() => {
                &[("type", "filter"), ("enter/esc", "done")]
            }
            InitStep::WorktreeDir => &[("enter", "next"), ("esc", "cancel")],
            InitStep::Hooks => &[
                ("space", "toggle"),
                ("tab", "hook"),
                ("/", "search"),
                ("enter", "next"),
                ("esc", "back"),
            ],
            InitStep::Confirm => &[("enter", "save"), ("esc", "back")],
            InitStep::Saving => &[],
            InitStep::Complete => &[("enter", "dashboard")],
        };
        lines.push(help_line(theme, bindings));
        fit_frame(lines, width, height)
    }
}

fn suggestion_row(suggestion: &HookSuggestion) -> String {
    let mark = if suggestion.enabled { "[x]" } else { "[ ]" };
    let mut row = format!(
        "{mark} {:<11} {}  ({})",
        suggestion.kind.as_str(),
        suggestion.command,
        suggestion.reason
    );
    if suggestion.interactive {
        row.push_str(" interactive");
    }
    row
}

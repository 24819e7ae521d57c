//! Worktree dashboard: the view the app starts in and returns to.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use tracing::debug;

use super::{FlowContext, FLOW_CHROME};
use crate::commands::{Command, Outcome, Route};
use crate::git::WorktreeSummary;
use crate::hooks::{HookKind, HookPoint};
use crate::ui::theme::Theme;
use crate::ui::widgets::{
    choice_row, error_banner, fit_frame, help_line, spinner, success_banner, title_line,
    warning_banner,
};
use crate::viewport::{Viewport, VIEWPORT_CHROME};

#[derive(Debug, Clone, PartialEq, Eq)]
struct RemovalPrompt {
    path: PathBuf,
    branch: Option<String>,
    dirty: bool,
    changes: usize,
}

impl RemovalPrompt {
    fn text(&self) -> String {
        let name = self
            .branch
            .clone()
            .unwrap_or_else(|| self.path.display().to_string());
        if self.dirty {
            format!(
                "{name} has {} uncommitted change{}. Remove anyway and discard them? (y/n)",
                self.changes,
                if self.changes == 1 { "" } else { "s" }
            )
        } else {
            format!("Remove worktree {name}? (y/n)")
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    worktrees: Viewport<WorktreeSummary>,
    loading: bool,
    removing: Option<PathBuf>,
    confirm: Option<RemovalPrompt>,
    error: Option<String>,
    notice: Option<String>,
    frame: usize,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            worktrees: Viewport::default(),
            loading: true,
            removing: None,
            confirm: None,
            error: None,
            notice: None,
            frame: 0,
        }
    }
}

impl DashboardState {
    pub fn worktrees(&self) -> &Viewport<WorktreeSummary> {
        &self.worktrees
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn handle_key(mut self, key: &KeyEvent, _ctx: &FlowContext<'_>) -> (Self, Option<Command>) {
        if let Some(prompt) = self.confirm.take() {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                self.removing = Some(prompt.path.clone());
                return (
                    self,
                    Some(Command::RemoveWorktree {
                        path: prompt.path,
                        branch: prompt.branch,
                        force: prompt.dirty,
                    }),
                );
            }
            return (self, None);
        }

        if self.worktrees.is_searching() {
            self.worktrees.handle_key(key);
            return (self, None);
        }

        self.error = None;
        self.notice = None;
        match key.code {
            KeyCode::Char('n') => (self, Some(Command::Open(Route::Create))),
            KeyCode::Char('i') => (self, Some(Command::Open(Route::Init))),
            KeyCode::Char('r') => {
                self.loading = true;
                (self, Some(Command::LoadWorktrees))
            }
            KeyCode::Char('d') => {
                self.prompt_removal();
                (self, None)
            }
            KeyCode::Enter => {
                let chosen = self.worktrees.selected().map(|wt| wt.path.clone());
                (self, chosen.map(Command::Choose))
            }
            KeyCode::Char('q') => (self, Some(Command::Quit)),
            KeyCode::Esc if !self.worktrees.query().is_empty() => {
                self.worktrees.set_query("");
                (self, None)
            }
            KeyCode::Esc => (self, Some(Command::Quit)),
            _ => {
                self.worktrees.handle_key(key);
                (self, None)
            }
        }
    }

    fn prompt_removal(&mut self) {
        if self.removing.is_some() {
            return;
        }
        let Some(selected) = self.worktrees.selected() else {
            return;
        };
        if selected.is_main {
            self.error = Some("The main worktree cannot be removed.".to_string());
            return;
        }
        self.confirm = Some(RemovalPrompt {
            path: selected.path.clone(),
            branch: selected.branch.clone(),
            dirty: selected.is_dirty(),
            changes: selected.uncommitted + selected.untracked,
        });
    }

    pub fn handle_outcome(
        mut self,
        outcome: Outcome,
        _ctx: &FlowContext<'_>,
    ) -> (Self, Option<Command>) {
        match outcome {
            Outcome::Worktrees(Ok(worktrees)) => {
                self.loading = false;
                self.worktrees.set_items(worktrees);
                (self, None)
            }
            Outcome::Worktrees(Err(err)) => {
                self.loading = false;
                self.error = Some(err.to_string());
                (self, None)
            }
            Outcome::WorktreeRemoved {
                path,
                branch,
                result,
            } => {
                self.removing = None;
                match result {
                    Ok(()) => {
                        self.notice = Some(format!("Removed {}", path.display()));
                        self.loading = true;
                        let point = HookPoint {
                            kind: HookKind::PostRemove,
                            target: path,
                            branch,
                            base_branch: None,
                        };
                        (
                            self,
                            Some(Command::Batch(vec![
                                Command::LoadWorktrees,
                                Command::EnterHookPoint(point),
                            ])),
                        )
                    }
                    Err(err) => {
                        self.error = Some(err.to_string());
                        (self, None)
                    }
                }
            }
            other @ (Outcome::Branches(_)
            | Outcome::WorktreeCreated(_)
            | Outcome::ConfigSaved(_)
            | Outcome::HooksFinished(_)) => {
                debug!(outcome = other.label(), "dashboard ignores outcome");
                (self, None)
            }
        }
    }

    pub fn tick(&mut self) {
        if self.loading || self.removing.is_some() {
            self.frame = self.frame.wrapping_add(1);
        }
    }

    pub fn resize(&mut self, height: usize) {
        self.worktrees
            .set_container_height(height.saturating_sub(FLOW_CHROME), VIEWPORT_CHROME);
    }

    pub fn render(&self, theme: &Theme, width: usize, height: usize) -> String {
        let mut lines = vec![title_line(theme, "Worktrees", None), String::new()];
        if self.loading && self.worktrees.items().is_empty() {
            lines.push(format!("{} Loading worktrees…", spinner(self.frame)));
        } else {
            let branch_width = self
                .worktrees
                .items()
                .iter()
                .map(|wt| branch_label(wt).chars().count())
                .max()
                .unwrap_or(0);
            lines.extend(self.worktrees.render(
                theme,
                "No worktrees. Press n to create one.",
                |wt, selected| choice_row(theme, &worktree_row(wt, branch_width), selected),
            ));
        }
        lines.push(String::new());

        if let Some(prompt) = &self.confirm {
            lines.push(warning_banner(theme, &prompt.text()));
        } else if let Some(path) = &self.removing {
            lines.push(format!(
                "{} Removing {}…",
                spinner(self.frame),
                path.display()
            ));
        } else if let Some(error) = &self.error {
            lines.push(error_banner(theme, error));
        } else if let Some(notice) = &self.notice {
            lines.push(success_banner(theme, notice));
        }

        let help = if self.worktrees.is_searching() {
            help_line(theme, &[("type", "filter"), ("enter/esc", "done")])
        } else {
            help_line(
                theme,
                &[
                    ("enter", "open"),
                    ("n", "new"),
                    ("d", "remove"),
                    ("i", "init"),
                    ("/", "search"),
                    ("r", "refresh"),
                    ("q", "quit"),
                ],
            )
        };
        lines.push(help);
        fit_frame(lines, width, height)
    }
}

fn branch_label(worktree: &WorktreeSummary) -> String {
    worktree
        .branch
        .clone()
        .unwrap_or_else(|| "(detached)".to_string())
}

fn worktree_row(worktree: &WorktreeSummary, branch_width: usize) -> String {
    let mut row = format!(
        "{:<branch_width$}  {}",
        branch_label(worktree),
        worktree.path.display()
    );
    if worktree.is_main {
        row.push_str("  [main]");
    }
    if worktree.uncommitted > 0 {
        row.push_str(&format!("  ~{}", worktree.uncommitted));
    }
    if worktree.untracked > 0 {
        row.push_str(&format!("  ?{}", worktree.untracked));
    }
    row
}

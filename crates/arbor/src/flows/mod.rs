//! Views and wizard flows.
//!
//! Each view is a state value with by-value transitions:
//! `handle_key(self, key, ctx) -> (Self, Option<Command>)`. The app owns
//! exactly one `View` at a time and swaps it on every event. Leaving a flow
//! is expressed as `Command::Open(Route::Dashboard)`.
//!
//! Submodules:
//! - dashboard: worktree list, removal, entry points to the flows
//! - create: worktree creation wizard
//! - init: project configuration wizard

pub mod create;
pub mod dashboard;
pub mod init;

use crossterm::event::KeyEvent;

use crate::commands::{Command, Outcome};
use crate::config::Config;
use crate::git::Repository;
use crate::ui::theme::Theme;

pub use create::{CreateStep, CreationState};
pub use dashboard::DashboardState;
pub use init::{InitStep, InitializationState};

/// Read-only collaborators a flow may consult while handling an event.
pub struct FlowContext<'a> {
    pub repo: &'a dyn Repository,
    pub config: &'a Config,
}

#[derive(Debug)]
pub enum View {
    Dashboard(DashboardState),
    Create(CreationState),
    Init(InitializationState),
}

impl Default for View {
    fn default() -> Self {
        View::Dashboard(DashboardState::default())
    }
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Dashboard(_) => "dashboard",
            View::Create(_) => "create",
            View::Init(_) => "init",
        }
    }

    pub fn handle_key(self, key: &KeyEvent, ctx: &FlowContext<'_>) -> (View, Option<Command>) {
        match self {
            View::Dashboard(state) => {
                let (state, command) = state.handle_key(key, ctx);
                (View::Dashboard(state), command)
            }
            View::Create(state) => {
                let (state, command) = state.handle_key(key, ctx);
                (View::Create(state), command)
            }
            View::Init(state) => {
                let (state, command) = state.handle_key(key, ctx);
                (View::Init(state), command)
            }
        }
    }

    pub fn handle_outcome(
        self,
        outcome: Outcome,
        ctx: &FlowContext<'_>,
    ) -> (View, Option<Command>) {
        match self {
            View::Dashboard(state) => {
                let (state, command) = state.handle_outcome(outcome, ctx);
                (View::Dashboard(state), command)
            }
            View::Create(state) => {
                let (state, command) = state.handle_outcome(outcome, ctx);
                (View::Create(state), command)
            }
            View::Init(state) => {
                let (state, command) = state.handle_outcome(outcome, ctx);
                (View::Init(state), command)
            }
        }
    }

    pub fn tick(&mut self) {
        match self {
            View::Dashboard(state) => state.tick(),
            View::Create(state) => state.tick(),
            View::Init(state) => state.tick(),
        }
    }

    pub fn resize(&mut self, height: usize) {
        match self {
            View::Dashboard(state) => state.resize(height),
            View::Create(state) => state.resize(height),
            View::Init(state) => state.resize(height),
        }
    }

    /// Render exactly `height` rows no wider than `width`.
    pub fn render(&self, theme: &Theme, width: usize, height: usize) -> String {
        match self {
            View::Dashboard(state) => state.render(theme, width, height),
            View::Create(state) => state.render(theme, width, height),
            View::Init(state) => state.render(theme, width, height),
        }
    }
}

/// Why a branch name is rejected, or `None` when it is acceptable.
///
/// Allowed characters are ASCII letters, digits, `-`, `_` and `/`. Empty
/// names are the caller's concern.
pub fn branch_name_error(name: &str) -> Option<&'static str> {
    if name
        .chars()
        .any(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '/')))
    {
        return Some("Use letters, digits, '-', '_' or '/' only.");
    }
    if name.starts_with('/') || name.ends_with('/') || name.contains("//") {
        return Some("Slashes must separate non-empty parts.");
    }
    if name.starts_with('-') {
        return Some("Branch names cannot start with '-'.");
    }
    None
}

/// Rows a flow spends on its title, spacing, banner and help footer.
pub(crate) const FLOW_CHROME: usize = 6;

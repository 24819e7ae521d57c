//! Application state types and core data structures.
//!
//! Defines the App struct which holds all mutable application state,
//! plus the hook protocol phase and status banner types.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::commands::{Route, Ticket};
use crate::config::{Config, ConfigStore};
use crate::events::AppEvent;
use crate::flows::View;
use crate::git::Repository;
use crate::hooks::{HandoffRequest, HookApprovalState, HookKind, ProcessRunner};
use crate::ui::theme::Theme;

/// Message shown in the status line until the next key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Info(String),
    Success(String),
    Error(String),
}

/// Where the hook protocol currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookPhase {
    Idle,
    /// The approval modal is up and owns key input.
    PendingApproval(HookApprovalState),
    /// Approved commands are running on a worker thread.
    Running { ticket: Ticket, kind: HookKind },
    /// Interactive commands own the terminal.
    Suspended { ticket: Ticket, kind: HookKind },
}

pub struct App {
    pub(super) view: View,
    /// Ticket of the active view; completions carrying another are stale.
    pub(super) view_ticket: Ticket,
    pub(super) next_ticket: u64,
    pub(super) hooks: HookPhase,
    pub(super) pending_handoff: Option<(Ticket, HandoffRequest)>,
    pub(super) repo: Arc<dyn Repository>,
    pub(super) store: Arc<dyn ConfigStore>,
    pub(super) runner: Arc<dyn ProcessRunner + Send + Sync>,
    pub(super) config: Config,
    pub(super) theme: Theme,
    pub(super) width: u16,
    pub(super) height: u16,
    pub(super) banner: Option<Banner>,
    pub(super) frame: usize,
    pub(super) event_tx: Sender<AppEvent>,
    pub should_quit: bool,
    pub chosen: Option<PathBuf>,
}

impl App {
    pub fn new(
        repo: Arc<dyn Repository>,
        store: Arc<dyn ConfigStore>,
        runner: Arc<dyn ProcessRunner + Send + Sync>,
        theme: Theme,
        event_tx: Sender<AppEvent>,
    ) -> Self {
        let config = store.load_config(repo.root());
        Self {
            view: View::default(),
            view_ticket: Ticket(0),
            next_ticket: 1,
            hooks: HookPhase::Idle,
            pending_handoff: None,
            repo,
            store,
            runner,
            config,
            theme,
            width: 80,
            height: 24,
            banner: None,
            frame: 0,
            event_tx,
            should_quit: false,
            chosen: None,
        }
    }

    /// Open the dashboard and start loading worktrees.
    pub fn start(&mut self) {
        super::input::open(self, Route::Dashboard);
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn hook_phase(&self) -> &HookPhase {
        &self.hooks
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Interactive hook run waiting for the runner to hand over the terminal.
    pub fn take_handoff(&mut self) -> Option<(Ticket, HandoffRequest)> {
        self.pending_handoff.take()
    }

    /// Key under which approvals for this repository are stored.
    pub fn project_key(&self) -> String {
        self.repo.root().to_string_lossy().to_string()
    }

    pub(super) fn issue_ticket(&mut self) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    /// Rows available to the active view; the last row is the status line.
    pub(super) fn body_height(&self) -> usize {
        usize::from(self.height).saturating_sub(1)
    }
}

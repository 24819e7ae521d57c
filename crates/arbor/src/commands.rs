//! Deferred commands and their outcomes.
//!
//! Flow handlers never do I/O themselves. They return a `Command`
//! describing the work; the app runs it (on a worker thread when it
//! touches git or disk) and feeds the `Outcome` back as an event tagged
//! with the `Ticket` that was current when the work was dispatched.

use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use tracing::debug;

use crate::config::ConfigFile;
use crate::error::{RepoError, StoreError};
use crate::events::AppEvent;
use crate::git::{BranchSummary, CreateRequest, WorktreeSummary};
use crate::hooks::{HandoffResult, HookPoint};

/// Identifies who dispatched a piece of deferred work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Create,
    Init,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    LoadWorktrees,
    LoadBranches,
    CreateWorktree(CreateRequest),
    RemoveWorktree {
        path: PathBuf,
        branch: Option<String>,
        force: bool,
    },
    SaveProjectConfig(ConfigFile),
    ReloadConfig,
    EnterHookPoint(HookPoint),
    Open(Route),
    /// Exit and report this worktree to the caller.
    Choose(PathBuf),
    Quit,
    Batch(Vec<Command>),
}

#[derive(Debug)]
pub enum Outcome {
    Worktrees(Result<Vec<WorktreeSummary>, RepoError>),
    Branches(Result<Vec<BranchSummary>, RepoError>),
    WorktreeCreated(Result<PathBuf, RepoError>),
    WorktreeRemoved {
        path: PathBuf,
        branch: Option<String>,
        result: Result<(), RepoError>,
    },
    ConfigSaved(Result<PathBuf, StoreError>),
    HooksFinished(HandoffResult),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Worktrees(_) => "worktrees",
            Outcome::Branches(_) => "branches",
            Outcome::WorktreeCreated(_) => "worktree-created",
            Outcome::WorktreeRemoved { .. } => "worktree-removed",
            Outcome::ConfigSaved(_) => "config-saved",
            Outcome::HooksFinished(_) => "hooks-finished",
        }
    }
}

/// Run `work` on a worker thread and deliver its outcome as an event.
pub fn spawn_task<F>(tx: &Sender<AppEvent>, ticket: Ticket, work: F)
where
    F: FnOnce() -> Outcome + Send + 'static,
{
    let tx = tx.clone();
    std::thread::spawn(move || {
        let outcome = work();
        debug!(%ticket, outcome = outcome.label(), "task finished");
        let _ = tx.send(AppEvent::Completed { ticket, outcome });
    });
}

//! User-configured hook commands.
//!
//! Hooks run at fixed points of a flow (after a worktree is created or
//! removed). Before anything runs, commands not yet trusted for the project
//! go through the approval protocol in `approval`; execution, including the
//! terminal handoff for interactive commands, lives in `exec`.

pub mod approval;
pub mod exec;

use std::fmt;
use std::path::PathBuf;

pub use approval::{enter_hook_point, ApprovalDecision, HookApprovalState, HookEntry};
pub use exec::{
    run_hooks, CapturedHandoff, HandoffRequest, HandoffResult, ProcessHandoff, ProcessRunner,
    ShellRunner, StdioMode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    PostCreate,
    PostRemove,
}

impl HookKind {
    pub const ALL: [HookKind; 2] = [HookKind::PostCreate, HookKind::PostRemove];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::PostCreate => "post_create",
            HookKind::PostRemove => "post_remove",
        }
    }

    pub fn next(&self) -> HookKind {
        match self {
            HookKind::PostCreate => HookKind::PostRemove,
            HookKind::PostRemove => HookKind::PostCreate,
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookCommand {
    pub command: String,
    /// Needs direct terminal access while it runs.
    pub interactive: bool,
}

impl HookCommand {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            interactive: false,
        }
    }

    pub fn interactive(command: &str) -> Self {
        Self {
            command: command.to_string(),
            interactive: true,
        }
    }
}

/// Where and for what a hook run happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookPoint {
    pub kind: HookKind,
    pub target: PathBuf,
    pub branch: Option<String>,
    pub base_branch: Option<String>,
}

/// Canonical form used for approval lookups: trimmed, single-spaced.
pub fn normalize_command(command: &str) -> String {
    command.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Hook approval protocol.
//!
//! Entering a hook point filters the registered commands against the
//! project's approval record. When everything is already trusted the run
//! starts straight away; otherwise a modal lists only the untrusted commands
//! and asks to approve-and-run or skip. Approval is written before anything
//! runs, and skipping changes nothing.

use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent};

use super::exec::HandoffRequest;
use super::{normalize_command, HookCommand, HookPoint};
use crate::config::ApprovalRecord;
use crate::ui::text::truncate;
use crate::ui::theme::Theme;
use crate::ui::widgets::{boxed, choice_row};

pub const APPROVE: usize = 0;
pub const SKIP: usize = 1;

const MAX_COMMAND_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookApprovalState {
    pub visible: bool,
    /// Commands that still need approval, in configured order.
    pub pending: Vec<String>,
    pub selected: usize,
    pub point: HookPoint,
    /// Every command that runs once approved, approved ones included.
    pub commands: Vec<HookCommand>,
    pub has_interactive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEntry {
    /// No commands registered for this point.
    Nothing,
    /// Everything is approved; run without asking.
    Run(HandoffRequest),
    Prompt(HookApprovalState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    Pending(HookApprovalState),
    Approve(HookApprovalState),
    Skip,
}

/// Decide what happens when a flow reaches a hook point.
pub fn enter_hook_point(
    point: HookPoint,
    commands: &[HookCommand],
    approvals: &ApprovalRecord,
    repo_root: &Path,
) -> HookEntry {
    if commands.is_empty() {
        return HookEntry::Nothing;
    }
    let mut pending: Vec<String> = Vec::new();
    for hook in commands {
        let seen = pending
            .iter()
            .any(|other| normalize_command(other) == normalize_command(&hook.command));
        if !approvals.is_approved(&hook.command) && !seen {
            pending.push(hook.command.clone());
        }
    }
    if pending.is_empty() {
        return HookEntry::Run(HandoffRequest::for_point(&point, commands, repo_root));
    }
    HookEntry::Prompt(HookApprovalState {
        visible: true,
        pending,
        selected: APPROVE,
        has_interactive: commands.iter().any(|hook| hook.interactive),
        commands: commands.to_vec(),
        point,
    })
}

impl HookApprovalState {
    pub fn handle_key(mut self, key: &KeyEvent) -> ApprovalDecision {
        match key.code {
            KeyCode::Left
            | KeyCode::Right
            | KeyCode::Up
            | KeyCode::Down
            | KeyCode::Tab
            | KeyCode::BackTab
            | KeyCode::Char('h')
            | KeyCode::Char('l')
            | KeyCode::Char('j')
            | KeyCode::Char('k') => {
                self.selected = if self.selected == APPROVE { SKIP } else { APPROVE };
                ApprovalDecision::Pending(self)
            }
            KeyCode::Enter => {
                if self.selected == APPROVE {
                    ApprovalDecision::Approve(self)
                } else {
                    ApprovalDecision::Skip
                }
            }
            KeyCode::Char('y') => ApprovalDecision::Approve(self),
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('s') => ApprovalDecision::Skip,
            _ => ApprovalDecision::Pending(self),
        }
    }

    /// Mark every pending command approved. Returns how many were new.
    pub fn record_approval(&self, record: &mut ApprovalRecord) -> usize {
        self.pending
            .iter()
            .filter(|command| record.approve(command))
            .count()
    }

    pub fn request(&self, repo_root: &Path) -> HandoffRequest {
        HandoffRequest::for_point(&self.point, &self.commands, repo_root)
    }

    pub fn render(&self, theme: &Theme) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "The {} hook wants to run {} new command{}:",
            self.point.kind,
            self.pending.len(),
            if self.pending.len() == 1 { "" } else { "s" }
        ));
        lines.push(String::new());
        for command in &self.pending {
            let interactive = self
                .commands
                .iter()
                .any(|hook| hook.interactive && &hook.command == command);
            let mut line = format!("  $ {}", truncate(command, MAX_COMMAND_WIDTH));
            if interactive {
                line.push_str(&Theme::paint(theme.warning, " (interactive)"));
            }
            lines.push(line);
        }
        lines.push(String::new());
        if self.has_interactive {
            lines.push(Theme::paint(
                theme.muted,
                "Interactive hooks take over the terminal until they exit.",
            ));
        }
        lines.push(Theme::paint(
            theme.muted,
            format!("In: {}", self.point.target.display()),
        ));
        lines.push(String::new());
        lines.push(format!(
            "{}   {}",
            choice_row(theme, "Approve and run", self.selected == APPROVE),
            choice_row(theme, "Skip", self.selected == SKIP)
        ));
        boxed(theme, Some("Approve hooks?"), &lines)
    }
}

//! Project detection for hook suggestions.
//!
//! Looks for well-known marker files in the repository root and suggests
//! the setup command a fresh worktree usually needs.

use std::path::Path;

use crate::hooks::{HookCommand, HookKind};
use crate::viewport::ListItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookSuggestion {
    pub command: String,
    pub kind: HookKind,
    pub interactive: bool,
    /// Why this was suggested, e.g. the marker file.
    pub reason: String,
    pub enabled: bool,
}

impl HookSuggestion {
    fn detected(command: &str, marker: &str) -> Self {
        Self {
            command: command.to_string(),
            kind: HookKind::PostCreate,
            interactive: false,
            reason: marker.to_string(),
            enabled: false,
        }
    }

    pub fn hook(&self) -> HookCommand {
        if self.interactive {
            HookCommand::interactive(&self.command)
        } else {
            HookCommand::new(&self.command)
        }
    }
}

impl ListItem for HookSuggestion {
    fn filter_key(&self) -> &str {
        &self.command
    }
}

/// Marker file, command, interactive.
const MARKERS: &[(&str, &str, bool)] = &[
    ("Cargo.toml", "cargo fetch", false),
    ("go.mod", "go mod download", false),
    ("Gemfile", "bundle install", false),
    ("requirements.txt", "pip install -r requirements.txt", false),
    ("uv.lock", "uv sync", false),
    ("poetry.lock", "poetry install", false),
    ("mise.toml", "mise install", false),
    (".tool-versions", "mise install", false),
    (".env.example", "cp .env.example .env", false),
    (".envrc", "direnv allow", true),
];

fn node_install(root: &Path) -> Option<(&'static str, &'static str)> {
    if !root.join("package.json").is_file() {
        return None;
    }
    let lockfiles = [
        ("pnpm-lock.yaml", "pnpm install"),
        ("yarn.lock", "yarn install"),
        ("bun.lockb", "bun install"),
        ("bun.lock", "bun install"),
    ];
    let command = lockfiles
        .iter()
        .find(|(lockfile, _)| root.join(lockfile).is_file())
        .map(|(_, command)| *command)
        .unwrap_or("npm install");
    Some(("package.json", command))
}

/// Suggested hooks for the project at `root`, in a stable order.
pub fn detect_hook_suggestions(root: &Path) -> Vec<HookSuggestion> {
    let mut suggestions: Vec<HookSuggestion> = Vec::new();
    let mut push = |suggestion: HookSuggestion| {
        if !suggestions.iter().any(|s| s.command == suggestion.command) {
            suggestions.push(suggestion);
        }
    };

    if let Some((marker, command)) = node_install(root) {
        push(HookSuggestion::detected(command, marker));
    }
    for (marker, command, interactive) in MARKERS {
        if root.join(marker).exists() {
            let mut suggestion = HookSuggestion::detected(command, marker);
            suggestion.interactive = *interactive;
            push(suggestion);
        }
    }
    suggestions
}

/// Merge detected suggestions with hooks that are already configured.
/// Configured hooks come first and start enabled.
pub fn merge_with_configured(
    detected: Vec<HookSuggestion>,
    configured: &[(HookKind, HookCommand)],
) -> Vec<HookSuggestion> {
    let mut merged: Vec<HookSuggestion> = configured
        .iter()
        .map(|(kind, hook)| HookSuggestion {
            command: hook.command.clone(),
            kind: *kind,
            interactive: hook.interactive,
            reason: "configured".to_string(),
            enabled: true,
        })
        .collect();
    for suggestion in detected {
        if !merged.iter().any(|s| s.command == suggestion.command) {
            merged.push(suggestion);
        }
    }
    merged
}

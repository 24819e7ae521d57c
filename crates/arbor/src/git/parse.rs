//! Parsers for git plumbing output.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    pub name: String,
    pub is_head: bool,
    pub ahead: usize,
    pub behind: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeEntry {
    pub path: PathBuf,
    pub branch: Option<String>,
    pub bare: bool,
}

/// Parse `for-each-ref --format=%(HEAD)%09%(refname:short)%09%(upstream:track,nobracket)`.
pub fn parse_branch_refs(output: &str) -> Vec<BranchRef> {
    let mut branches = Vec::new();
    for line in output.lines() {
        let mut fields = line.splitn(3, '\t');
        let head = fields.next().unwrap_or_default();
        let Some(name) = fields.next().map(str::trim).filter(|name| !name.is_empty()) else {
            continue;
        };
        let track = fields.next().unwrap_or_default();
        let (ahead, behind) = parse_track(track);
        branches.push(BranchRef {
            name: name.to_string(),
            is_head: head.trim() == "*",
            ahead,
            behind,
        });
    }
    branches
}

/// Parse "ahead 3, behind 1" style tracking info. "gone" counts as zero.
fn parse_track(track: &str) -> (usize, usize) {
    let mut ahead = 0;
    let mut behind = 0;
    for part in track.split(',') {
        let mut words = part.split_whitespace();
        match (words.next(), words.next().and_then(|n| n.parse::<usize>().ok())) {
            (Some("ahead"), Some(count)) => ahead = count,
            (Some("behind"), Some(count)) => behind = count,
            _ => {}
        }
    }
    (ahead, behind)
}

/// Count (uncommitted, untracked) entries in `status --porcelain` output.
pub fn parse_status_counts(output: &str) -> (usize, usize) {
    let mut uncommitted = 0;
    let mut untracked = 0;
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with("??") {
            untracked += 1;
        } else {
            uncommitted += 1;
        }
    }
    (uncommitted, untracked)
}

/// Parse `worktree list --porcelain`. Bare entries are dropped.
pub fn parse_worktrees(output: &str) -> Vec<WorktreeEntry> {
    let mut entries = Vec::new();
    let mut current: Option<WorktreeEntry> = None;
    for line in output.lines() {
        let line = line.trim();
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            current = Some(WorktreeEntry {
                path: PathBuf::from(path),
                branch: None,
                bare: false,
            });
        } else if let Some(reference) = line.strip_prefix("branch ") {
            if let Some(entry) = current.as_mut() {
                let name = reference.strip_prefix("refs/heads/").unwrap_or(reference);
                entry.branch = Some(name.to_string());
            }
        } else if line == "bare" {
            if let Some(entry) = current.as_mut() {
                entry.bare = true;
            }
        }
    }
    if let Some(entry) = current {
        entries.push(entry);
    }
    entries.retain(|entry| !entry.bare);
    entries
}

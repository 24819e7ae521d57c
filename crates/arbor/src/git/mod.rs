//! Git command execution and repository access.
//!
//! Provides a thin wrapper around git CLI commands. All git operations
//! go through `run_git` which captures stdout/stderr and exit codes.
//! `GitRepository` implements the `Repository` trait the flows talk to:
//! - listing branches with dirty counts and upstream divergence
//! - listing, creating and removing worktrees
//! - computing where a worktree for a branch lives

mod parse;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::RepoError;
use crate::viewport::ListItem;

pub use parse::{parse_branch_refs, parse_status_counts, parse_worktrees, BranchRef, WorktreeEntry};

#[derive(Debug, Clone)]
pub struct ExecResult {
    pub ok: bool,
    pub stdout: String,
    pub stderr: String,
}

pub fn run_git(args: &[&str], cwd: &Path) -> ExecResult {
    debug!(?args, cwd = %cwd.display(), "git");
    let output = Command::new("git").args(args).current_dir(cwd).output();
    match output {
        Ok(out) => ExecResult {
            ok: out.status.success(),
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        },
        Err(err) => ExecResult {
            ok: false,
            stdout: String::new(),
            stderr: err.to_string(),
        },
    }
}

fn git_checked(args: &[&str], cwd: &Path) -> Result<String, RepoError> {
    let result = run_git(args, cwd);
    if result.ok {
        return Ok(result.stdout);
    }
    let message = result
        .stderr
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("unknown error")
        .to_string();
    Err(RepoError::Git {
        args: args.join(" "),
        message,
    })
}

pub fn resolve_repo_root(cwd: &Path) -> Option<PathBuf> {
    let result = run_git(["rev-parse", "--git-common-dir"].as_ref(), cwd);
    if !result.ok {
        return None;
    }

    let git_common = result.stdout.trim();
    if git_common.is_empty() {
        return None;
    }

    let git_path = Path::new(git_common);
    let resolved = if git_path.is_absolute() {
        git_path.to_path_buf()
    } else {
        cwd.join(git_path)
    };

    let canonical = fs::canonicalize(&resolved).unwrap_or(resolved);
    canonical.parent().map(|path| path.to_path_buf())
}

/// Snapshot of one local branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSummary {
    pub name: String,
    pub clean: bool,
    pub uncommitted: usize,
    pub untracked: usize,
    pub ahead: usize,
    pub behind: usize,
    pub is_current: bool,
    /// Worktree the branch is checked out in, if any.
    pub worktree: Option<PathBuf>,
}

impl ListItem for BranchSummary {
    fn filter_key(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeSummary {
    pub path: PathBuf,
    pub branch: Option<String>,
    pub is_main: bool,
    pub uncommitted: usize,
    pub untracked: usize,
    pub display: String,
}

impl WorktreeSummary {
    pub fn is_dirty(&self) -> bool {
        self.uncommitted > 0 || self.untracked > 0
    }
}

impl ListItem for WorktreeSummary {
    fn filter_key(&self) -> &str {
        &self.display
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchSource {
    /// Create the branch from `base`.
    New { base: String },
    Existing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub branch: String,
    pub source: BranchSource,
    pub path: PathBuf,
}

/// Repository operations the UI depends on.
pub trait Repository: Send + Sync {
    fn root(&self) -> &Path;
    fn list_branches(&self) -> Result<Vec<BranchSummary>, RepoError>;
    fn list_worktrees(&self) -> Result<Vec<WorktreeSummary>, RepoError>;
    fn worktree_path(&self, worktree_root: &Path, branch: &str) -> PathBuf;
    fn create_worktree(&self, request: &CreateRequest) -> Result<PathBuf, RepoError>;
    fn remove_worktree(&self, path: &Path, force: bool) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    pub fn open(cwd: &Path) -> Result<Self, RepoError> {
        let root =
            resolve_repo_root(cwd).ok_or_else(|| RepoError::NotARepository(cwd.to_path_buf()))?;
        Ok(Self { root })
    }

    fn status_counts(&self, path: &Path) -> (usize, usize) {
        if !path.is_dir() {
            return (0, 0);
        }
        let result = run_git(["status", "--porcelain"].as_ref(), path);
        if !result.ok {
            return (0, 0);
        }
        parse_status_counts(&result.stdout)
    }
}

/// Directory name for a branch: path separators become dashes.
pub fn worktree_dir_name(branch: &str) -> String {
    branch
        .chars()
        .map(|ch| if ch == '/' || ch == '\\' { '-' } else { ch })
        .collect()
}

impl Repository for GitRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_branches(&self) -> Result<Vec<BranchSummary>, RepoError> {
        let refs = git_checked(
            [
                "for-each-ref",
                "--format=%(HEAD)%09%(refname:short)%09%(upstream:track,nobracket)",
                "refs/heads",
            ]
            .as_ref(),
            &self.root,
        )?;
        let worktrees = git_checked(["worktree", "list", "--porcelain"].as_ref(), &self.root)?;
        let checked_out: HashMap<String, PathBuf> = parse_worktrees(&worktrees)
            .into_iter()
            .filter_map(|entry| entry.branch.map(|branch| (branch, entry.path)))
            .collect();

        let branches = parse_branch_refs(&refs)
            .into_iter()
            .map(|branch| {
                let worktree = checked_out.get(&branch.name).cloned();
                let (uncommitted, untracked) = worktree
                    .as_deref()
                    .map(|path| self.status_counts(path))
                    .unwrap_or((0, 0));
                BranchSummary {
                    clean: uncommitted == 0 && untracked == 0,
                    name: branch.name,
                    uncommitted,
                    untracked,
                    ahead: branch.ahead,
                    behind: branch.behind,
                    is_current: branch.is_head,
                    worktree,
                }
            })
            .collect();
        Ok(branches)
    }

    fn list_worktrees(&self) -> Result<Vec<WorktreeSummary>, RepoError> {
        let output = git_checked(["worktree", "list", "--porcelain"].as_ref(), &self.root)?;
        let worktrees = parse_worktrees(&output)
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let (uncommitted, untracked) = self.status_counts(&entry.path);
                let label = entry
                    .branch
                    .clone()
                    .unwrap_or_else(|| "(detached)".to_string());
                WorktreeSummary {
                    display: format!("{label} {}", entry.path.display()),
                    path: entry.path,
                    branch: entry.branch,
                    is_main: index == 0,
                    uncommitted,
                    untracked,
                }
            })
            .collect();
        Ok(worktrees)
    }

    fn worktree_path(&self, worktree_root: &Path, branch: &str) -> PathBuf {
        let root = if worktree_root.is_absolute() {
            worktree_root.to_path_buf()
        } else {
            self.root.join(worktree_root)
        };
        root.join(worktree_dir_name(branch))
    }

    fn create_worktree(&self, request: &CreateRequest) -> Result<PathBuf, RepoError> {
        if let Some(parent) = request.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let path = request.path.to_string_lossy().to_string();
        match &request.source {
            BranchSource::New { base } => git_checked(
                [
                    "worktree",
                    "add",
                    "-b",
                    request.branch.as_str(),
                    path.as_str(),
                    base.as_str(),
                ]
                .as_ref(),
                &self.root,
            )?,
            BranchSource::Existing => git_checked(
                ["worktree", "add", path.as_str(), request.branch.as_str()].as_ref(),
                &self.root,
            )?,
        };
        info!(branch = %request.branch, path = %request.path.display(), "created worktree");
        Ok(request.path.clone())
    }

    fn remove_worktree(&self, path: &Path, force: bool) -> Result<(), RepoError> {
        let path_str = path.to_string_lossy().to_string();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(path_str.as_str());
        git_checked(&args, &self.root)?;
        info!(path = %path.display(), force, "removed worktree");
        Ok(())
    }
}

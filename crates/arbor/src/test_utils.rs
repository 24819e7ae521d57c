//! In-memory collaborators for tests.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::{merge_config, ApprovalRecord, Config, ConfigFile, ConfigStore};
use crate::error::{HookError, RepoError, StoreError};
use crate::git::{BranchSummary, CreateRequest, Repository, WorktreeSummary};
use crate::hooks::{ProcessRunner, StdioMode};

pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

pub fn chars(text: &str) -> Vec<KeyEvent> {
    text.chars().map(|ch| key(KeyCode::Char(ch))).collect()
}

pub fn branch(name: &str, dirty: bool) -> BranchSummary {
    BranchSummary {
        name: name.to_string(),
        clean: !dirty,
        uncommitted: usize::from(dirty),
        untracked: 0,
        ahead: 0,
        behind: 0,
        is_current: false,
        worktree: None,
    }
}

pub fn worktree(path: &str, branch: &str, is_main: bool) -> WorktreeSummary {
    WorktreeSummary {
        path: PathBuf::from(path),
        branch: Some(branch.to_string()),
        is_main,
        uncommitted: 0,
        untracked: 0,
        display: format!("{branch} {path}"),
    }
}

fn git_error(args: &str) -> RepoError {
    RepoError::Git {
        args: args.to_string(),
        message: "fatal: simulated failure".to_string(),
    }
}

/// Repository double with canned listings. Mutations are recorded.
#[derive(Debug, Default)]
pub struct FakeRepository {
    pub root: PathBuf,
    pub branches: Vec<BranchSummary>,
    pub worktrees: Mutex<Vec<WorktreeSummary>>,
    pub created: Mutex<Vec<CreateRequest>>,
    pub removed: Mutex<Vec<(PathBuf, bool)>>,
    pub fail_create: AtomicBool,
    pub fail_list: AtomicBool,
}

impl FakeRepository {
    pub fn new(root: &str) -> Self {
        Self {
            root: PathBuf::from(root),
            worktrees: Mutex::new(vec![worktree(root, "main", true)]),
            ..Self::default()
        }
    }

    pub fn with_branches(mut self, branches: Vec<BranchSummary>) -> Self {
        self.branches = branches;
        self
    }
}

impl Repository for FakeRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_branches(&self) -> Result<Vec<BranchSummary>, RepoError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(git_error("for-each-ref"));
        }
        Ok(self.branches.clone())
    }

    fn list_worktrees(&self) -> Result<Vec<WorktreeSummary>, RepoError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(git_error("worktree list"));
        }
        Ok(self.worktrees.lock().expect("worktrees lock").clone())
    }

    fn worktree_path(&self, worktree_root: &Path, branch: &str) -> PathBuf {
        self.root
            .join(worktree_root)
            .join(crate::git::worktree_dir_name(branch))
    }

    fn create_worktree(&self, request: &CreateRequest) -> Result<PathBuf, RepoError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(git_error("worktree add"));
        }
        self.created
            .lock()
            .expect("created lock")
            .push(request.clone());
        Ok(request.path.clone())
    }

    fn remove_worktree(&self, path: &Path, force: bool) -> Result<(), RepoError> {
        self.removed
            .lock()
            .expect("removed lock")
            .push((path.to_path_buf(), force));
        self.worktrees
            .lock()
            .expect("worktrees lock")
            .retain(|worktree| worktree.path != path);
        Ok(())
    }
}

fn denied(path: &str) -> StoreError {
    StoreError::Io {
        path: PathBuf::from(path),
        source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
    }
}

/// Config store kept in memory. Approval failures can be switched on.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub config: Mutex<Option<ConfigFile>>,
    pub approvals: Mutex<BTreeMap<String, ApprovalRecord>>,
    pub fail_load_approvals: AtomicBool,
    pub fail_save_approvals: AtomicBool,
    pub fail_save_config: AtomicBool,
}

impl MemoryStore {
    pub fn with_config(config: ConfigFile) -> Self {
        Self {
            config: Mutex::new(Some(config)),
            ..Self::default()
        }
    }

    pub fn approved(&self, project: &str) -> ApprovalRecord {
        self.approvals
            .lock()
            .expect("approvals lock")
            .get(project)
            .cloned()
            .unwrap_or_default()
    }
}

impl ConfigStore for MemoryStore {
    fn load_config(&self, _repo_root: &Path) -> Config {
        merge_config(None, self.config.lock().expect("config lock").clone())
    }

    fn save_project_config(
        &self,
        repo_root: &Path,
        config: &ConfigFile,
    ) -> Result<PathBuf, StoreError> {
        if self.fail_save_config.load(Ordering::SeqCst) {
            return Err(denied("config.toml"));
        }
        *self.config.lock().expect("config lock") = Some(config.clone());
        Ok(crate::config::project_config_path(repo_root))
    }

    fn load_approvals(&self, project: &str) -> Result<ApprovalRecord, StoreError> {
        if self.fail_load_approvals.load(Ordering::SeqCst) {
            return Err(denied("approvals.toml"));
        }
        Ok(self.approved(project))
    }

    fn save_approvals(&self, project: &str, record: &ApprovalRecord) -> Result<(), StoreError> {
        if self.fail_save_approvals.load(Ordering::SeqCst) {
            return Err(denied("approvals.toml"));
        }
        let mut approvals = self.approvals.lock().expect("approvals lock");
        let entry = approvals.entry(project.to_string()).or_default();
        for command in record.iter() {
            entry.approve(command);
        }
        Ok(())
    }
}

/// Runner that records commands instead of spawning them.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub calls: Mutex<Vec<(String, StdioMode)>>,
}

impl RecordingRunner {
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(command, _)| command.clone())
            .collect()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(
        &self,
        command: &str,
        _cwd: &Path,
        _env: &[(String, String)],
        stdio: StdioMode,
    ) -> Result<(), HookError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((command.to_string(), stdio));
        Ok(())
    }
}

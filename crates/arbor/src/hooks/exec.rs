//! Hook execution.
//!
//! A `HandoffRequest` describes one hook run: the commands, where they run
//! and their environment. A `ProcessHandoff` turns a request into a
//! `HandoffResult`. The captured variant runs on a worker thread while the
//! UI keeps drawing; the terminal variant (in the app runner) suspends the
//! UI and gives the child the terminal.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use tracing::{info, warn};

use super::{HookCommand, HookKind, HookPoint};
use crate::error::HookError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRequest {
    pub kind: HookKind,
    pub commands: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    pub interactive: bool,
}

impl HandoffRequest {
    pub fn for_point(point: &HookPoint, commands: &[HookCommand], repo_root: &Path) -> Self {
        let cwd = match point.kind {
            HookKind::PostCreate => point.target.clone(),
            HookKind::PostRemove => repo_root.to_path_buf(),
        };
        let env = vec![
            ("ARBOR_HOOK".to_string(), point.kind.as_str().to_string()),
            (
                "ARBOR_WORKTREE_PATH".to_string(),
                point.target.to_string_lossy().to_string(),
            ),
            (
                "ARBOR_BRANCH".to_string(),
                point.branch.clone().unwrap_or_default(),
            ),
            (
                "ARBOR_BASE_BRANCH".to_string(),
                point.base_branch.clone().unwrap_or_default(),
            ),
            (
                "ARBOR_REPO_ROOT".to_string(),
                repo_root.to_string_lossy().to_string(),
            ),
        ];
        Self {
            kind: point.kind,
            commands: commands.iter().map(|hook| hook.command.clone()).collect(),
            cwd,
            env,
            interactive: commands.iter().any(|hook| hook.interactive),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffResult {
    pub kind: HookKind,
    pub ran: usize,
    pub total: usize,
    pub failure: Option<HookError>,
}

impl HandoffResult {
    pub fn ok(&self) -> bool {
        self.failure.is_none()
    }

    pub fn summary(&self) -> String {
        match &self.failure {
            None => format!("{} hooks finished ({} ran).", self.kind, self.ran),
            Some(err) => format!("{} hook failed: {err}", self.kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    Capture,
    Inherit,
}

/// Spawns one shell command and reports how it ended.
pub trait ProcessRunner {
    fn run(
        &self,
        command: &str,
        cwd: &Path,
        env: &[(String, String)],
        stdio: StdioMode,
    ) -> Result<(), HookError>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for Arc<R> {
    fn run(
        &self,
        command: &str,
        cwd: &Path,
        env: &[(String, String)],
        stdio: StdioMode,
    ) -> Result<(), HookError> {
        (**self).run(command, cwd, env, stdio)
    }
}

/// Runs commands through `sh -c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ProcessRunner for ShellRunner {
    fn run(
        &self,
        command: &str,
        cwd: &Path,
        env: &[(String, String)],
        stdio: StdioMode,
    ) -> Result<(), HookError> {
        let mut process = Command::new("sh");
        process.arg("-c").arg(command).current_dir(cwd);
        for (key, value) in env {
            process.env(key, value);
        }
        let spawn_error = |err: std::io::Error| HookError::Spawn {
            command: command.to_string(),
            message: err.to_string(),
        };
        match stdio {
            StdioMode::Capture => {
                let output = process
                    .stdin(Stdio::null())
                    .output()
                    .map_err(spawn_error)?;
                if output.status.success() {
                    return Ok(());
                }
                let stderr = String::from_utf8_lossy(&output.stderr);
                let detail = stderr
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .last()
                    .map(|line| format!("{}: {line}", output.status))
                    .unwrap_or_else(|| output.status.to_string());
                Err(HookError::Failed {
                    command: command.to_string(),
                    status: detail,
                })
            }
            StdioMode::Inherit => {
                let status = process
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .map_err(spawn_error)?;
                if status.success() {
                    Ok(())
                } else {
                    Err(HookError::Failed {
                        command: command.to_string(),
                        status: status.to_string(),
                    })
                }
            }
        }
    }
}

/// Run every command in order, stopping at the first failure.
pub fn run_hooks<R: ProcessRunner + ?Sized>(
    runner: &R,
    request: &HandoffRequest,
    stdio: StdioMode,
) -> HandoffResult {
    let mut ran = 0;
    for command in &request.commands {
        info!(hook = %request.kind, %command, cwd = %request.cwd.display(), "running hook");
        match runner.run(command, &request.cwd, &request.env, stdio) {
            Ok(()) => ran += 1,
            Err(err) => {
                warn!(hook = %request.kind, error = %err, "hook failed");
                return HandoffResult {
                    kind: request.kind,
                    ran,
                    total: request.commands.len(),
                    failure: Some(err),
                };
            }
        }
    }
    HandoffResult {
        kind: request.kind,
        ran,
        total: request.commands.len(),
        failure: None,
    }
}

/// Hands a hook run to something that executes it and reports back.
pub trait ProcessHandoff {
    fn run(&mut self, request: &HandoffRequest) -> HandoffResult;
}

/// Runs hooks with captured output; the UI is never suspended.
#[derive(Debug, Default)]
pub struct CapturedHandoff<R> {
    runner: R,
}

impl<R: ProcessRunner> CapturedHandoff<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: ProcessRunner> ProcessHandoff for CapturedHandoff<R> {
    fn run(&mut self, request: &HandoffRequest) -> HandoffResult {
        run_hooks(&self.runner, request, StdioMode::Capture)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        run_hooks, CapturedHandoff, HandoffRequest, ProcessHandoff, ProcessRunner, ShellRunner,
        StdioMode,
    };
    use crate::error::HookError;
    use crate::hooks::{HookCommand, HookKind, HookPoint};
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct RecordingRunner {
        calls: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl ProcessRunner for RecordingRunner {
        fn run(
            &self,
            command: &str,
            _cwd: &Path,
            _env: &[(String, String)],
            _stdio: StdioMode,
        ) -> Result<(), HookError> {
            self.calls.borrow_mut().push(command.to_string());
            if self.fail_on == Some(command) {
                return Err(HookError::Failed {
                    command: command.to_string(),
                    status: "exit status: 1".to_string(),
                });
            }
            Ok(())
        }
    }

    fn point(kind: HookKind) -> HookPoint {
        HookPoint {
            kind,
            target: PathBuf::from("/repo/.arbor/worktrees/otter"),
            branch: Some("otter".to_string()),
            base_branch: Some("main".to_string()),
        }
    }

    #[test]
    fn request_runs_post_create_in_the_new_worktree() {
        let commands = vec![HookCommand::new("make"), HookCommand::interactive("direnv allow")];
        let request =
            HandoffRequest::for_point(&point(HookKind::PostCreate), &commands, Path::new("/repo"));
        assert_eq!(request.cwd, PathBuf::from("/repo/.arbor/worktrees/otter"));
        assert!(request.interactive);
        assert!(request
            .env
            .contains(&("ARBOR_BRANCH".to_string(), "otter".to_string())));
        assert!(request
            .env
            .contains(&("ARBOR_BASE_BRANCH".to_string(), "main".to_string())));
    }

    #[test]
    fn request_runs_post_remove_in_repo_root() {
        let request = HandoffRequest::for_point(
            &point(HookKind::PostRemove),
            &[HookCommand::new("make clean")],
            Path::new("/repo"),
        );
        assert_eq!(request.cwd, PathBuf::from("/repo"));
        assert!(!request.interactive);
    }

    #[test]
    fn stops_at_first_failure() {
        let runner = RecordingRunner {
            calls: RefCell::new(Vec::new()),
            fail_on: Some("two"),
        };
        let request = HandoffRequest {
            kind: HookKind::PostCreate,
            commands: vec!["one".into(), "two".into(), "three".into()],
            cwd: PathBuf::from("."),
            env: Vec::new(),
            interactive: false,
        };
        let result = run_hooks(&runner, &request, StdioMode::Capture);
        assert_eq!(result.ran, 1);
        assert_eq!(result.total, 3);
        assert!(!result.ok());
        assert_eq!(*runner.calls.borrow(), vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn shell_runner_sees_hook_environment() {
        let dir = TempDir::new().expect("temp dir");
        let request = HandoffRequest {
            kind: HookKind::PostCreate,
            commands: vec!["printf %s \"$ARBOR_BRANCH\" > branch.txt".to_string()],
            cwd: dir.path().to_path_buf(),
            env: vec![("ARBOR_BRANCH".to_string(), "otter".to_string())],
            interactive: false,
        };
        let result = CapturedHandoff::new(ShellRunner).run(&request);
        assert!(result.ok(), "{:?}", result.failure);
        let written = std::fs::read_to_string(dir.path().join("branch.txt")).expect("read");
        assert_eq!(written, "otter");
    }

    #[test]
    fn shell_runs_the_command_as_configured() {
        let dir = TempDir::new().expect("temp dir");
        let point = HookPoint {
            kind: HookKind::PostCreate,
            target: dir.path().to_path_buf(),
            branch: None,
            base_branch: None,
        };
        let commands = [HookCommand::new("printf '%s' 'a    b' > out.txt")];
        let request = HandoffRequest::for_point(&point, &commands, dir.path());
        assert_eq!(request.commands, vec!["printf '%s' 'a    b' > out.txt".to_string()]);
        let result = run_hooks(&ShellRunner, &request, StdioMode::Capture);
        assert!(result.ok(), "{:?}", result.failure);
        let written = std::fs::read_to_string(dir.path().join("out.txt")).expect("read");
        assert_eq!(written, "a    b");
    }

    #[test]
    fn shell_runner_reports_exit_status_and_stderr() {
        let dir = TempDir::new().expect("temp dir");
        let err = ShellRunner
            .run(
                "echo nope >&2; exit 3",
                dir.path(),
                &[],
                StdioMode::Capture,
            )
            .expect_err("should fail");
        match err {
            HookError::Failed { status, .. } => assert!(status.contains("nope"), "{status}"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}

//! Configuration loading and merging.
//!
//! Config is loaded from two sources with the project taking precedence:
//! 1. User-level: `~/.config/arbor/config.toml`
//! 2. Project-level: `<repo>/.arbor/config.toml`
//!
//! Supports the worktree root and hook commands per hook kind. Uses TOML
//! format with serde. Approval records live next to the user config and
//! are handled by `store`.

mod store;


use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::StoreError;
use crate::hooks::{HookCommand, HookKind};

pub use store::{ApprovalRecord, ConfigStore, FileConfigStore};

pub const DEFAULT_WORKTREE_ROOT: &str = ".arbor/worktrees";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub worktree: WorktreeConfig,
    pub hooks: HooksConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeConfig {
    /// Relative to the repository root unless absolute.
    pub root: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HooksConfig {
    pub post_create: Vec<HookCommand>,
    pub post_remove: Vec<HookCommand>,
}

impl HooksConfig {
    pub fn for_kind(&self, kind: HookKind) -> &[HookCommand] {
        match kind {
            HookKind::PostCreate => &self.post_create,
            HookKind::PostRemove => &self.post_remove,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        merge_config(None, None)
    }
}

/// On-disk shape of a config file. Also what the init flow writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree: Option<RawWorktree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<RawHooks>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawWorktree {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawHooks {
    #[serde(
        default,
        alias = "postCreate",
        skip_serializing_if = "Option::is_none"
    )]
    pub post_create: Option<Vec<RawHook>>,
    #[serde(
        default,
        alias = "postRemove",
        skip_serializing_if = "Option::is_none"
    )]
    pub post_remove: Option<Vec<RawHook>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawHook {
    Plain(String),
    Detailed {
        command: String,
        #[serde(default)]
        interactive: bool,
    },
}

impl From<&RawHook> for HookCommand {
    fn from(raw: &RawHook) -> Self {
        match raw {
            RawHook::Plain(command) => HookCommand::new(command),
            RawHook::Detailed {
                command,
                interactive: true,
            } => HookCommand::interactive(command),
            RawHook::Detailed { command, .. } => HookCommand::new(command),
        }
    }
}

impl From<&HookCommand> for RawHook {
    fn from(hook: &HookCommand) -> Self {
        if hook.interactive {
            RawHook::Detailed {
                command: hook.command.clone(),
                interactive: true,
            }
        } else {
            RawHook::Plain(hook.command.clone())
        }
    }
}

impl ConfigFile {
    pub fn new(worktree_root: Option<String>, hooks: &HooksConfig) -> Self {
        let encode = |commands: &[HookCommand]| {
            if commands.is_empty() {
                None
            } else {
                Some(commands.iter().map(RawHook::from).collect())
            }
        };
        let post_create = encode(&hooks.post_create);
        let post_remove = encode(&hooks.post_remove);
        Self {
            worktree: worktree_root.map(|root| RawWorktree { root: Some(root) }),
            hooks: if post_create.is_none() && post_remove.is_none() {
                None
            } else {
                Some(RawHooks {
                    post_create,
                    post_remove,
                })
            },
        }
    }
}

pub(crate) fn read_toml(path: &Path) -> Result<Option<ConfigFile>, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if contents.trim().is_empty() {
        return Ok(None);
    }
    toml::from_str::<ConfigFile>(&contents)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a config file, logging and ignoring anything unreadable.
fn read_toml_lenient(path: &Path) -> Option<ConfigFile> {
    match read_toml(path) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "ignoring unreadable config");
            None
        }
    }
}

fn merge_hooks(
    user: Option<&RawHooks>,
    project: Option<&RawHooks>,
    pick: fn(&RawHooks) -> Option<&Vec<RawHook>>,
) -> Vec<HookCommand> {
    project
        .and_then(pick)
        .or_else(|| user.and_then(pick))
        .map(|hooks| hooks.iter().map(HookCommand::from).collect())
        .unwrap_or_default()
}

pub(crate) fn merge_config(user: Option<ConfigFile>, project: Option<ConfigFile>) -> Config {
    let project_worktree = project.as_ref().and_then(|c| c.worktree.as_ref());
    let user_worktree = user.as_ref().and_then(|c| c.worktree.as_ref());
    let root = project_worktree
        .and_then(|w| w.root.clone())
        .or_else(|| user_worktree.and_then(|w| w.root.clone()))
        .filter(|root| !root.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_WORKTREE_ROOT.to_string());

    let project_hooks = project.as_ref().and_then(|c| c.hooks.as_ref());
    let user_hooks = user.as_ref().and_then(|c| c.hooks.as_ref());
    let post_create = merge_hooks(user_hooks, project_hooks, |h| h.post_create.as_ref());
    let post_remove = merge_hooks(user_hooks, project_hooks, |h| h.post_remove.as_ref());

    Config {
        worktree: WorktreeConfig {
            root: PathBuf::from(root),
        },
        hooks: HooksConfig {
            post_create,
            post_remove,
        },
    }
}

pub fn project_config_path(repo_root: &Path) -> PathBuf {
    repo_root.join(".arbor").join("config.toml")
}

pub fn user_config_path(home: &Path) -> PathBuf {
    home.join(".config").join("arbor").join("config.toml")
}

pub fn load_config(home: Option<&Path>, repo_root: &Path) -> Config {
    let project_config = read_toml_lenient(&project_config_path(repo_root));
    let user_config = home.and_then(|home| read_toml_lenient(&user_config_path(home)));
    merge_config(user_config, project_config)
}

//! Persistent settings: project config files and hook approvals.
//!
//! Approvals are stored per project in:
//! `~/.config/arbor/approvals.toml`
//!
//! ```toml
//! [projects."/path/to/repo"]
//! "npm install" = true
//! ```
//!
//! Saving merges with what is on disk, so an approval is never dropped by
//! a later save.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::{load_config, project_config_path, Config, ConfigFile};
use crate::error::StoreError;
use crate::hooks::normalize_command;

/// Commands approved for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalRecord {
    approved: BTreeSet<String>,
}

impl ApprovalRecord {
    pub fn is_approved(&self, command: &str) -> bool {
        self.approved.contains(&normalize_command(command))
    }

    /// Returns true when the command was not approved before.
    pub fn approve(&mut self, command: &str) -> bool {
        self.approved.insert(normalize_command(command))
    }

    pub fn len(&self) -> usize {
        self.approved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approved.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.approved.iter()
    }
}

/// Load/save access to configuration and approvals.
pub trait ConfigStore: Send + Sync {
    fn load_config(&self, repo_root: &Path) -> Config;
    fn save_project_config(
        &self,
        repo_root: &Path,
        config: &ConfigFile,
    ) -> Result<PathBuf, StoreError>;
    fn load_approvals(&self, project: &str) -> Result<ApprovalRecord, StoreError>;
    fn save_approvals(&self, project: &str, record: &ApprovalRecord) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct ApprovalsFile {
    #[serde(default)]
    projects: BTreeMap<String, BTreeMap<String, bool>>,
}

/// Files under a home directory plus the project's `.arbor/config.toml`.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    home: Option<PathBuf>,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            home: dirs::home_dir(),
        }
    }

    pub fn with_home(home: &Path) -> Self {
        Self {
            home: Some(home.to_path_buf()),
        }
    }

    fn approvals_path(&self) -> Result<PathBuf, StoreError> {
        let home = self.home.as_ref().ok_or(StoreError::NoHome)?;
        Ok(home.join(".config").join("arbor").join("approvals.toml"))
    }

    fn read_approvals(&self, path: &Path) -> Result<ApprovalsFile, StoreError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ApprovalsFile::default())
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(ApprovalsFile::default());
        }
        toml::from_str(&contents).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), StoreError> {
    let io_error = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, contents).map_err(io_error)
}

impl ConfigStore for FileConfigStore {
    fn load_config(&self, repo_root: &Path) -> Config {
        load_config(self.home.as_deref(), repo_root)
    }

    fn save_project_config(
        &self,
        repo_root: &Path,
        config: &ConfigFile,
    ) -> Result<PathBuf, StoreError> {
        let path = project_config_path(repo_root);
        let contents = toml::to_string_pretty(config)?;
        write_file(&path, &contents)?;
        Ok(path)
    }

    fn load_approvals(&self, project: &str) -> Result<ApprovalRecord, StoreError> {
        let file = self.read_approvals(&self.approvals_path()?)?;
        let mut record = ApprovalRecord::default();
        if let Some(commands) = file.projects.get(project) {
            for (command, approved) in commands {
                if *approved {
                    record.approve(command);
                }
            }
        }
        Ok(record)
    }

    fn save_approvals(&self, project: &str, record: &ApprovalRecord) -> Result<(), StoreError> {
        let path = self.approvals_path()?;
        // A file we cannot parse is not overwritten.
        let mut file = self.read_approvals(&path)?;
        let entry = file.projects.entry(project.to_string()).or_default();
        for command in record.iter() {
            entry.insert(command.clone(), true);
        }
        let contents = toml::to_string_pretty(&file)?;
        write_file(&path, &contents)
    }
}

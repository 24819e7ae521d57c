//! Error types shared across the crate.
//!
//! Nothing here is fatal: the UI turns every variant into an inline
//! message or a banner on the current step.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not inside a git repository: {}", .0.display())]
    NotARepository(PathBuf),
    #[error("git {args} failed: {message}")]
    Git { args: String, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("no home directory available")]
    NoHome,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("failed to start `{command}`: {message}")]
    Spawn { command: String, message: String },
    #[error("`{command}` exited with {status}")]
    Failed { command: String, status: String },
}

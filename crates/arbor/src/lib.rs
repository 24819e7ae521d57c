//! Interactive terminal dashboard and wizards for git worktrees.
//!
//! Modules:
//! - app: event loop, command dispatch, hook protocol, terminal handoff
//! - flows: dashboard, creation and initialization views
//! - viewport: scrolling list with live filtering
//! - ui: styled text widgets and the modal compositor
//! - git: repository access through the `git` binary
//! - hooks: approval state and hook execution
//! - config: TOML configuration and the approval store

pub mod animals;
pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod flows;
pub mod git;
pub mod hooks;
pub mod logging;
pub mod project;
pub mod ui;
pub mod viewport;

#[cfg(test)]
pub mod test_utils;

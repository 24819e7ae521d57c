//! File logging.
//!
//! The TUI owns the terminal, so logs go to a file under the user's
//! state directory. `ARBOR_LOG` takes an `EnvFilter` directive and
//! defaults to `info`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "ARBOR_LOG";
pub const LOG_FILE: &str = "arbor.log";

pub fn log_dir(home: &Path) -> PathBuf {
    home.join(".local").join("state").join("arbor")
}

/// Install the global subscriber. The returned guard flushes buffered
/// lines when dropped, so hold it until exit. Returns `None` when no log
/// file can be opened; the app then runs without logs.
pub fn init() -> Option<WorkerGuard> {
    let dir = log_dir(&dirs::home_dir()?);
    fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .ok()?;
    Some(guard)
}

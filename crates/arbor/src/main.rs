use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use arbor::config::FileConfigStore;
use arbor::git::{GitRepository, Repository};

/// Terminal dashboard for git worktrees. Prints the chosen worktree path.
#[derive(Debug, Parser)]
#[command(name = "arbor", version, about)]
struct Args {
    /// Repository to open; defaults to the current directory.
    #[arg(long)]
    repo: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = arbor::logging::init();

    let cwd = match args.repo {
        Some(path) => path,
        None => std::env::current_dir().context("failed to read the current directory")?,
    };
    let repo = GitRepository::open(&cwd)
        .with_context(|| format!("cannot open a repository at {}", cwd.display()))?;
    tracing::info!(root = %repo.root().display(), "starting");

    let chosen = arbor::app::run(Arc::new(repo), Arc::new(FileConfigStore::new()))
        .context("terminal error")?;
    if let Some(path) = chosen {
        println!("{}", path.display());
    }
    Ok(())
}

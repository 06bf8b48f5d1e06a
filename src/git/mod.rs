//! Git operations module

mod branch;
mod merge;

pub use branch::{BranchRef, Manager as BranchManager};
pub use merge::{TreeMergeOutcome, execute as execute_merge, simulate as simulate_merge};

use anyhow::{Context, Result};
use git2::Repository;
use std::path::Path;
use std::process::Command;

/// Open a git repository at the given path
///
/// # Errors
///
/// Returns an error if the path is not a git repository
pub fn open_repository(path: &Path) -> Result<Repository> {
    Repository::discover(path)
        .with_context(|| format!("Failed to open git repository at {}", path.display()))
}

/// Check if a path is inside a git repository
#[must_use]
pub fn is_git_repository(path: &Path) -> bool {
    Repository::discover(path).is_ok()
}

/// Get the root of the git repository containing the given path
///
/// # Errors
///
/// Returns an error if the path is not inside a git repository
pub fn repository_root(path: &Path) -> Result<std::path::PathBuf> {
    let repo = open_repository(path)?;
    repo.workdir()
        .map(std::path::Path::to_path_buf)
        .context("Repository has no working directory")
}

/// Build a `git` invocation for the operations that go through the binary
/// instead of libgit2 (merge execution)
#[must_use]
pub fn git_command() -> Command {
    Command::new("git")
}

//! Collaborator interfaces and the git-backed implementation

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use crate::config::Config;
use crate::git::{self, BranchRef, TreeMergeOutcome};

/// Ahead/behind counts for a symmetric-difference range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AheadBehind {
    /// Commits reachable only from the first side of the range
    pub ahead: usize,
    /// Commits reachable only from the second side of the range
    pub behind: usize,
}

/// Version-control collaborators consumed by the status resolver
///
/// Implementations run to completion or failure; the resolver never cancels
/// an in-flight call and instead discards stale results on arrival.
#[async_trait]
pub trait PreviewBackend: Send + Sync {
    /// Dry-run merge between the `base` and `candidate` branch tips
    async fn simulate_tree_merge(
        &self,
        base: &BranchRef,
        candidate: &BranchRef,
    ) -> Result<TreeMergeOutcome>;

    /// Ahead/behind counts for a symmetric-difference `range`, or `None`
    /// when the range does not resolve
    async fn compute_ahead_behind(&self, range: &str) -> Result<Option<AheadBehind>>;

    /// Merge `branch_name` into the checked-out branch
    async fn execute_merge(&self, branch_name: &str) -> Result<()>;

    /// Whether tree-merge simulation should run at all
    fn conflict_detection_enabled(&self) -> bool;
}

/// Host surface behind the merge dialog
pub trait DialogHost: Send + Sync {
    /// Dismiss the surface after a successful merge submission
    fn close_dialog(&self);
}

/// [`PreviewBackend`] backed by libgit2 plus the system `git` binary
///
/// The repository is reopened per call on the blocking pool; libgit2 handles
/// are not shared across threads.
#[derive(Debug, Clone)]
pub struct GitBackend {
    repo_path: PathBuf,
    conflict_detection: bool,
}

impl GitBackend {
    /// Create a backend rooted at `repo_path`
    #[must_use]
    pub fn new(repo_path: PathBuf, config: &Config) -> Self {
        Self {
            repo_path,
            conflict_detection: config.conflict_detection,
        }
    }
}

#[async_trait]
impl PreviewBackend for GitBackend {
    async fn simulate_tree_merge(
        &self,
        base: &BranchRef,
        candidate: &BranchRef,
    ) -> Result<TreeMergeOutcome> {
        let path = self.repo_path.clone();
        let base = base.clone();
        let candidate = candidate.clone();

        tokio::task::spawn_blocking(move || {
            let repo = git::open_repository(&path)?;
            git::simulate_merge(&repo, &base, &candidate)
        })
        .await
        .context("Tree-merge simulation task failed")?
    }

    async fn compute_ahead_behind(&self, range: &str) -> Result<Option<AheadBehind>> {
        let path = self.repo_path.clone();
        let range = range.to_string();

        tokio::task::spawn_blocking(move || {
            let repo = git::open_repository(&path)?;
            let counts = git::BranchManager::new(&repo).ahead_behind(&range)?;
            Ok(counts.map(|(ahead, behind)| AheadBehind { ahead, behind }))
        })
        .await
        .context("Ahead/behind task failed")?
    }

    async fn execute_merge(&self, branch_name: &str) -> Result<()> {
        let path = self.repo_path.clone();
        let branch_name = branch_name.to_string();

        tokio::task::spawn_blocking(move || git::execute_merge(&path, &branch_name))
            .await
            .context("Merge execution task failed")?
    }

    fn conflict_detection_enabled(&self) -> bool {
        self.conflict_detection
    }
}

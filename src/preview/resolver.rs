//! Asynchronous merge status resolution

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::git::BranchRef;
use crate::preview::backend::PreviewBackend;
use crate::preview::floor::run_with_floor;
use crate::preview::result::MergePreviewResult;
use crate::preview::selection::StateHandle;

/// Recoverable failure of the tree-merge simulation
///
/// Degrades the merge-shape result to `Unknown`; the sibling commit-count
/// evaluation is unaffected.
#[derive(Debug, Error)]
#[error("merge evaluation failed for '{branch}': {reason:#}")]
pub struct EvaluationError {
    /// Candidate branch whose evaluation failed
    pub branch: String,
    /// Underlying simulation failure
    pub reason: anyhow::Error,
}

/// Orchestrates the two asynchronous evaluations for a candidate branch
///
/// Each evaluation applies its result through the staleness-checked state
/// handle the moment it resolves; the two are never batched and may land in
/// either order.
pub struct StatusResolver {
    backend: Arc<dyn PreviewBackend>,
    floor: Duration,
}

impl std::fmt::Debug for StatusResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusResolver")
            .field("floor", &self.floor)
            .finish_non_exhaustive()
    }
}

impl StatusResolver {
    /// Create a resolver with the given delay floor for merge-shape
    /// evaluations
    #[must_use]
    pub fn new(backend: Arc<dyn PreviewBackend>, floor: Duration) -> Self {
        Self { backend, floor }
    }

    /// Launch the evaluations for `candidate`
    ///
    /// The merge-shape evaluation runs only when conflict detection is
    /// enabled and there is a checked-out branch to merge into; it is
    /// wrapped by the delay floor and `Loading` is emitted before it starts.
    /// The commit-count evaluation always runs, unfloored. Either task
    /// discards its own result if the selection has moved on by the time it
    /// resolves.
    pub fn spawn_evaluation(
        &self,
        current: Option<&BranchRef>,
        candidate: &BranchRef,
        state: &StateHandle,
    ) -> EvaluationHandle {
        let merge_shape = if self.backend.conflict_detection_enabled() {
            current
                .map(|base| self.spawn_merge_shape(base.clone(), candidate.clone(), state.clone()))
        } else {
            None
        };

        let commit_count = self.spawn_commit_count(candidate.clone(), state.clone());

        EvaluationHandle {
            merge_shape,
            commit_count,
        }
    }

    fn spawn_merge_shape(
        &self,
        base: BranchRef,
        candidate: BranchRef,
        state: StateHandle,
    ) -> JoinHandle<()> {
        state.apply_merge_result(&candidate, MergePreviewResult::Loading);

        let backend = Arc::clone(&self.backend);
        let floor = self.floor;

        tokio::spawn(async move {
            let simulation = backend.simulate_tree_merge(&base, &candidate);
            let result = match run_with_floor(simulation, floor).await {
                Ok(outcome) => MergePreviewResult::from(outcome),
                Err(reason) => {
                    let error = EvaluationError {
                        branch: candidate.name.clone(),
                        reason,
                    };
                    warn!("{error}");
                    MergePreviewResult::Unknown
                }
            };

            state.apply_merge_result(&candidate, result);
        })
    }

    fn spawn_commit_count(&self, candidate: BranchRef, state: StateHandle) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);

        tokio::spawn(async move {
            let range = format!("HEAD...{}", candidate.name);
            let count = match backend.compute_ahead_behind(&range).await {
                Ok(Some(counts)) => counts.behind,
                // No data means nothing to merge; the action stays disabled.
                Ok(None) => 0,
                Err(error) => {
                    warn!(branch = %candidate.name, "Ahead/behind computation failed: {error:#}");
                    0
                }
            };

            state.apply_commit_count(&candidate, count);
        })
    }
}

/// Join handles for one evaluation's in-flight tasks
#[derive(Debug)]
pub struct EvaluationHandle {
    merge_shape: Option<JoinHandle<()>>,
    commit_count: JoinHandle<()>,
}

impl EvaluationHandle {
    /// Wait until both evaluations have been applied or discarded
    pub async fn finished(self) {
        if let Some(task) = self.merge_shape
            && task.await.is_err()
        {
            debug!("Merge-shape task ended abnormally");
        }
        if self.commit_count.await.is_err() {
            debug!("Commit-count task ended abnormally");
        }
    }
}

//! Selection state ownership and the merge dialog controller

use anyhow::{Result, bail, ensure};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::git::BranchRef;
use crate::preview::backend::{DialogHost, PreviewBackend};
use crate::preview::resolver::{EvaluationHandle, StatusResolver};
use crate::preview::result::MergePreviewResult;

/// Live state of the merge dialog for the current selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Currently selected candidate branch
    pub selected_branch: Option<BranchRef>,
    /// Latest merge-shape result for the selection
    pub merge_result: Option<MergePreviewResult>,
    /// Number of commits the merge would introduce; `None` while recomputing
    pub commit_count: Option<usize>,
    /// Free-form filter text from the branch list
    pub filter_text: String,
}

/// Shared, staleness-checked access to a dialog's [`SelectionState`]
///
/// The controller mutates the state through its own operations; async
/// continuations apply results through [`apply_merge_result`] and
/// [`apply_commit_count`], both of which re-verify under the lock that the
/// result's target branch is still the live selection and drop it silently
/// otherwise.
///
/// [`apply_merge_result`]: StateHandle::apply_merge_result
/// [`apply_commit_count`]: StateHandle::apply_commit_count
#[derive(Debug, Clone, Default)]
pub struct StateHandle {
    inner: Arc<Mutex<SelectionState>>,
}

impl StateHandle {
    /// Create a handle around an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn snapshot(&self) -> SelectionState {
        self.inner.lock().clone()
    }

    /// Record a selection change
    ///
    /// A `None` selection clears the preview and pins the commit count to
    /// zero; a new branch resets both result fields to "recomputing".
    pub(crate) fn set_selection(&self, branch: Option<BranchRef>) {
        let mut state = self.inner.lock();
        match branch {
            Some(branch) => {
                state.selected_branch = Some(branch);
                state.merge_result = None;
                state.commit_count = None;
            }
            None => {
                state.selected_branch = None;
                state.merge_result = None;
                state.commit_count = Some(0);
            }
        }
    }

    pub(crate) fn set_filter_text(&self, text: String) {
        self.inner.lock().filter_text = text;
    }

    /// Apply a merge-shape result computed for `branch`, unless stale
    ///
    /// An already-resolved commit count is folded into the incoming result.
    pub fn apply_merge_result(&self, branch: &BranchRef, result: MergePreviewResult) {
        let mut state = self.inner.lock();
        if !is_current(&state, branch) {
            debug!(branch = %branch.name, "Discarding stale merge result");
            return;
        }

        state.merge_result = Some(match state.commit_count {
            Some(count) => result.with_commit_count(count),
            None => result,
        });
    }

    /// Apply a commit count computed for `branch`, unless stale
    ///
    /// An already-present merge-shape result picks the count up in place.
    pub fn apply_commit_count(&self, branch: &BranchRef, count: usize) {
        let mut state = self.inner.lock();
        if !is_current(&state, branch) {
            debug!(branch = %branch.name, "Discarding stale commit count");
            return;
        }

        state.commit_count = Some(count);
        if let Some(result) = state.merge_result {
            state.merge_result = Some(result.with_commit_count(count));
        }
    }
}

fn is_current(state: &SelectionState, branch: &BranchRef) -> bool {
    state.selected_branch.as_ref() == Some(branch)
}

/// Controller for the merge dialog
///
/// Owns the selection, launches an evaluation on every change, and gates
/// merge submission on the resolved state.
pub struct SelectionController {
    backend: Arc<dyn PreviewBackend>,
    host: Arc<dyn DialogHost>,
    resolver: StatusResolver,
    current_branch: Option<BranchRef>,
    state: StateHandle,
}

impl std::fmt::Debug for SelectionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionController")
            .field("current_branch", &self.current_branch)
            .finish_non_exhaustive()
    }
}

impl SelectionController {
    /// Create a controller for a dialog opened on `current_branch`
    #[must_use]
    pub fn new(
        backend: Arc<dyn PreviewBackend>,
        host: Arc<dyn DialogHost>,
        current_branch: Option<BranchRef>,
        config: &Config,
    ) -> Self {
        let resolver = StatusResolver::new(Arc::clone(&backend), config.delay_floor());
        Self {
            backend,
            host,
            resolver,
            current_branch,
            state: StateHandle::new(),
        }
    }

    /// Resolve the branch pre-selected when the dialog opens
    ///
    /// An explicit override wins unconditionally. Otherwise the default
    /// branch is pre-selected, unless it is the checked-out branch itself
    /// (merging a branch into itself is meaningless), in which case nothing
    /// is pre-selected.
    #[must_use]
    pub fn initial_selection(
        current: Option<&BranchRef>,
        default: Option<&BranchRef>,
        override_branch: Option<BranchRef>,
    ) -> Option<BranchRef> {
        if let Some(branch) = override_branch {
            return Some(branch);
        }

        match (current, default) {
            (Some(current), Some(default)) if current == default => None,
            (_, default) => default.cloned(),
        }
    }

    /// Record a selection change and launch an evaluation for it
    ///
    /// A `None` selection clears the preview synchronously and disables the
    /// merge action; no evaluation is launched and `None` is returned. For a
    /// branch selection the returned handle resolves once both evaluations
    /// have been applied or discarded.
    pub fn on_selection_changed(&self, selection: Option<BranchRef>) -> Option<EvaluationHandle> {
        let Some(branch) = selection else {
            self.state.set_selection(None);
            return None;
        };

        debug!(branch = %branch.name, "Selection changed, evaluating merge preview");
        self.state.set_selection(Some(branch.clone()));
        Some(
            self.resolver
                .spawn_evaluation(self.current_branch.as_ref(), &branch, &self.state),
        )
    }

    /// Update the branch-list filter text; no evaluation side effect
    pub fn on_filter_text_changed(&self, text: &str) {
        self.state.set_filter_text(text.to_string());
    }

    /// Snapshot of the live selection state
    #[must_use]
    pub fn state(&self) -> SelectionState {
        self.state.snapshot()
    }

    /// The branch the dialog was opened on
    #[must_use]
    pub fn current_branch(&self) -> Option<&BranchRef> {
        self.current_branch.as_ref()
    }

    /// Whether the merge action is currently allowed
    ///
    /// Disabled without a selection, without a checked-out branch, for a
    /// self-merge, and when the resolved commit count is zero. A count that
    /// is still recomputing does not disable the action.
    #[must_use]
    pub fn can_submit_merge(&self) -> bool {
        let state = self.state.snapshot();
        let (Some(current), Some(selected)) =
            (self.current_branch.as_ref(), state.selected_branch.as_ref())
        else {
            return false;
        };

        current.name != selected.name && state.commit_count != Some(0)
    }

    /// Submit the merge for the selected branch, then dismiss the dialog
    ///
    /// # Errors
    ///
    /// Returns an error if submission is currently disabled, or if the
    /// merge-execution collaborator fails; execution failures are propagated
    /// untranslated
    pub async fn submit_merge(&self) -> Result<()> {
        let Some(branch) = self.state.snapshot().selected_branch else {
            bail!("Merge submission is disabled: no branch selected");
        };
        ensure!(
            self.can_submit_merge(),
            "Merge submission is disabled for '{}'",
            branch.name
        );

        debug!(branch = %branch.name, "Submitting merge");
        self.backend.execute_merge(&branch.name).await?;
        self.host.close_dialog();
        Ok(())
    }
}

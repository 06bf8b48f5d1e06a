//! Preview result data model

use crate::git::TreeMergeOutcome;

/// Outcome of evaluating a merge between two branches.
///
/// The commit count resolves independently of the merge shape and is folded
/// into the `Clean`/`Conflicted` variants as it lands; `None` means the count
/// evaluation has not resolved yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePreviewResult {
    /// Evaluation in flight, no data yet
    Loading,
    /// Merge would succeed with no conflicts
    Clean {
        /// Number of commits the candidate branch would introduce
        commit_count: Option<usize>,
    },
    /// Merge would produce conflicts
    Conflicted {
        /// Number of commits the candidate branch would introduce
        commit_count: Option<usize>,
        /// Number of files that would conflict
        conflicted_files: usize,
    },
    /// Evaluation not attempted, failed recoverably, or not supported for
    /// this pair
    Unknown,
}

impl MergePreviewResult {
    /// Fold a resolved commit count into the variant, where it carries one
    #[must_use]
    pub const fn with_commit_count(self, count: usize) -> Self {
        match self {
            Self::Clean { .. } => Self::Clean {
                commit_count: Some(count),
            },
            Self::Conflicted {
                conflicted_files, ..
            } => Self::Conflicted {
                commit_count: Some(count),
                conflicted_files,
            },
            other @ (Self::Loading | Self::Unknown) => other,
        }
    }

    /// Whether this result represents a finished evaluation
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

impl From<TreeMergeOutcome> for MergePreviewResult {
    fn from(outcome: TreeMergeOutcome) -> Self {
        match outcome {
            TreeMergeOutcome::Clean => Self::Clean { commit_count: None },
            TreeMergeOutcome::Conflicted { conflicted_files } => Self::Conflicted {
                commit_count: None,
                conflicted_files,
            },
            TreeMergeOutcome::Unknown => Self::Unknown,
        }
    }
}

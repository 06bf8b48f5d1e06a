//! Mergelens - live merge preview for git branches
//!
//! Given the checked-out branch and a candidate branch selected by a user,
//! mergelens determines whether merging the candidate would succeed cleanly,
//! conflict, or cannot be evaluated, and how many commits the merge would
//! introduce. Every selection change launches a fresh pair of overlapping
//! asynchronous evaluations; results that arrive for a branch that is no
//! longer selected are discarded instead of overwriting live state.

pub mod config;
pub mod git;
pub mod preview;

pub use config::Config;
pub use git::{BranchManager, BranchRef, TreeMergeOutcome};
pub use preview::{
    DialogHost, GitBackend, MergePreviewResult, PreviewBackend, SelectionController,
    SelectionState,
};

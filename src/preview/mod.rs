//! Live merge preview engine
//!
//! The engine is built from four pieces: the preview result data model, the
//! delay-floored task runner, the resolver that runs the two overlapping
//! asynchronous evaluations for a candidate branch, and the selection
//! controller that owns the dialog state those evaluations feed.
//! Version-control access goes through the [`PreviewBackend`] seam.

mod backend;
mod floor;
mod resolver;
mod result;
mod selection;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{AheadBehind, DialogHost, GitBackend, PreviewBackend};
pub use floor::run_with_floor;
pub use resolver::{EvaluationError, EvaluationHandle, StatusResolver};
pub use result::MergePreviewResult;
pub use selection::{SelectionController, SelectionState, StateHandle};

//! Scripted fakes for exercising the resolver and controller

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::git::{BranchRef, TreeMergeOutcome};
use crate::preview::backend::{AheadBehind, DialogHost, PreviewBackend};

/// Per-branch behavior of the fake backend
#[derive(Debug, Clone, Copy)]
pub(crate) struct BranchScript {
    /// Simulation outcome; `None` makes the simulation fail
    pub outcome: Option<TreeMergeOutcome>,
    /// Latency of the simulation call
    pub merge_delay: Duration,
    /// Behind count; `None` models an unresolvable range
    pub behind: Option<usize>,
    /// Latency of the ahead/behind call
    pub count_delay: Duration,
    /// Make the ahead/behind call fail outright
    pub count_fails: bool,
}

impl Default for BranchScript {
    fn default() -> Self {
        Self {
            outcome: Some(TreeMergeOutcome::Clean),
            merge_delay: Duration::ZERO,
            behind: Some(1),
            count_delay: Duration::ZERO,
            count_fails: false,
        }
    }
}

/// Scripted [`PreviewBackend`] with per-branch latencies and outcomes
#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    detection: bool,
    scripts: HashMap<String, BranchScript>,
    /// Number of simulation calls observed
    pub simulate_calls: AtomicUsize,
    /// Branch names passed to `execute_merge`, in order
    pub merged: Mutex<Vec<String>>,
    /// Make `execute_merge` fail
    pub fail_merge: bool,
}

impl FakeBackend {
    pub fn new(detection: bool) -> Self {
        Self {
            detection,
            ..Self::default()
        }
    }

    /// Attach a script for `branch`; unscripted branches resolve instantly
    /// as clean with one commit behind
    pub fn script(mut self, branch: &str, script: BranchScript) -> Self {
        self.scripts.insert(branch.to_string(), script);
        self
    }

    fn script_for(&self, branch: &str) -> BranchScript {
        self.scripts.get(branch).copied().unwrap_or_default()
    }
}

#[async_trait]
impl PreviewBackend for FakeBackend {
    async fn simulate_tree_merge(
        &self,
        _base: &BranchRef,
        candidate: &BranchRef,
    ) -> Result<TreeMergeOutcome> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script_for(&candidate.name);

        tokio::time::sleep(script.merge_delay).await;
        match script.outcome {
            Some(outcome) => Ok(outcome),
            None => bail!("simulated merge failure for '{}'", candidate.name),
        }
    }

    async fn compute_ahead_behind(&self, range: &str) -> Result<Option<AheadBehind>> {
        let name = range.strip_prefix("HEAD...").unwrap_or(range);
        let script = self.script_for(name);

        tokio::time::sleep(script.count_delay).await;
        if script.count_fails {
            bail!("simulated ahead/behind failure for '{name}'");
        }
        Ok(script.behind.map(|behind| AheadBehind { ahead: 0, behind }))
    }

    async fn execute_merge(&self, branch_name: &str) -> Result<()> {
        if self.fail_merge {
            bail!("simulated merge-execution failure for '{branch_name}'");
        }
        self.merged.lock().push(branch_name.to_string());
        Ok(())
    }

    fn conflict_detection_enabled(&self) -> bool {
        self.detection
    }
}

/// Host that records whether the dialog was dismissed
#[derive(Debug, Default)]
pub(crate) struct FakeHost {
    /// Set once `close_dialog` has been called
    pub closed: AtomicBool,
}

impl DialogHost for FakeHost {
    fn close_dialog(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

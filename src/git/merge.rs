//! Merge simulation and execution

use anyhow::{Context, Result, bail};
use git2::{MergeOptions, Repository};
use std::collections::BTreeSet;
use std::path::Path;

use super::branch::BranchRef;

/// Outcome of a dry-run merge between two branch tips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeMergeOutcome {
    /// The merge would complete without conflicts
    Clean,
    /// The merge would stop with conflict markers
    Conflicted {
        /// Number of files that would conflict
        conflicted_files: usize,
    },
    /// The outcome could not be determined for this pair
    Unknown,
}

/// Simulate merging `candidate` into `base` without touching the working
/// directory
///
/// The merge is computed in memory between the two branch tips. Identical
/// tips, or a candidate already reachable from `base`, are trivially clean.
///
/// # Errors
///
/// Returns an error if either branch cannot be resolved to a commit or the
/// in-memory merge cannot be computed
pub fn simulate(
    repo: &Repository,
    base: &BranchRef,
    candidate: &BranchRef,
) -> Result<TreeMergeOutcome> {
    let base_commit = resolve_tip(repo, base)?;
    let candidate_commit = resolve_tip(repo, candidate)?;

    if base_commit.id() == candidate_commit.id() {
        return Ok(TreeMergeOutcome::Clean);
    }

    let merge_base = repo
        .merge_base(base_commit.id(), candidate_commit.id())
        .with_context(|| {
            format!(
                "Failed to find merge base between '{}' and '{}'",
                base.name, candidate.name
            )
        })?;

    // Candidate already reachable from base: nothing to merge.
    if merge_base == candidate_commit.id() {
        return Ok(TreeMergeOutcome::Clean);
    }

    let mut merge_opts = MergeOptions::new();
    merge_opts.fail_on_conflict(false);

    let index = repo
        .merge_commits(&base_commit, &candidate_commit, Some(&merge_opts))
        .with_context(|| {
            format!(
                "Failed to simulate merge between '{}' and '{}'",
                base.name, candidate.name
            )
        })?;

    if index.has_conflicts() {
        let conflicted_files = count_conflicted_paths(&index)?;
        Ok(TreeMergeOutcome::Conflicted { conflicted_files })
    } else {
        Ok(TreeMergeOutcome::Clean)
    }
}

/// Merge `branch_name` into the currently checked-out branch
///
/// Runs the `git` binary in the repository working directory; libgit2 is not
/// used for the mutating path.
///
/// # Errors
///
/// Returns an error if the merge command cannot be spawned or exits with a
/// non-zero status; the combined stderr/stdout is the error message
pub fn execute(repo_path: &Path, branch_name: &str) -> Result<()> {
    let output = super::git_command()
        .args([
            "merge",
            branch_name,
            "-m",
            &format!("Merge branch '{branch_name}'"),
        ])
        .current_dir(repo_path)
        .output()
        .context("Failed to execute merge")?;

    if output.status.success() {
        return Ok(());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let error_msg = if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else if !stdout.trim().is_empty() {
        stdout.trim().to_string()
    } else {
        "Unknown error".to_string()
    };

    bail!("Merge failed: {error_msg}")
}

fn resolve_tip<'r>(repo: &'r Repository, branch: &BranchRef) -> Result<git2::Commit<'r>> {
    let object = repo
        .revparse_single(&branch.full_name)
        .with_context(|| format!("Branch not found: {}", branch.name))?;
    object
        .peel_to_commit()
        .with_context(|| format!("Failed to resolve branch '{}' to a commit", branch.name))
}

fn count_conflicted_paths(index: &git2::Index) -> Result<usize> {
    let mut paths = BTreeSet::new();

    for conflict in index.conflicts().context("Failed to read merge conflicts")? {
        let conflict = conflict.context("Failed to read merge conflict entry")?;
        if let Some(entry) = conflict.our.or(conflict.their).or(conflict.ancestor) {
            paths.insert(entry.path);
        }
    }

    Ok(paths.len())
}

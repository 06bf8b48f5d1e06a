//! Git branch enumeration

use anyhow::{Context, Result};
use git2::{BranchType, ErrorCode, Repository};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Reference to a git branch, as produced by branch enumeration.
///
/// The identity of a branch is its full reference name; equality and hashing
/// consider only that field. The remaining fields support presentation and do
/// not participate in identity.
#[derive(Debug, Clone)]
pub struct BranchRef {
    /// Branch name (without remote prefix for remote branches)
    pub name: String,
    /// Full reference name (e.g., "refs/remotes/origin/main")
    pub full_name: String,
    /// Whether this is a remote-tracking branch
    pub is_remote: bool,
    /// Remote name (e.g., "origin") for remote branches
    pub remote: Option<String>,
}

impl BranchRef {
    /// Create a reference to a local branch by name
    #[must_use]
    pub fn local(name: &str) -> Self {
        Self {
            name: name.to_string(),
            full_name: format!("refs/heads/{name}"),
            is_remote: false,
            remote: None,
        }
    }
}

impl PartialEq for BranchRef {
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name
    }
}

impl Eq for BranchRef {}

impl std::hash::Hash for BranchRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.full_name.hash(state);
    }
}

/// Manager for git branch operations
pub struct Manager<'a> {
    repo: &'a Repository,
}

impl std::fmt::Debug for Manager<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager").finish_non_exhaustive()
    }
}

impl<'a> Manager<'a> {
    /// Create a new branch manager for the given repository
    #[must_use]
    pub const fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Get the currently checked-out branch
    ///
    /// Returns `None` when HEAD is detached or unborn.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD cannot be read
    pub fn current(&self) -> Result<Option<BranchRef>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(error) if error.code() == ErrorCode::UnbornBranch => return Ok(None),
            Err(error) => return Err(error).context("Failed to get HEAD"),
        };

        if !head.is_branch() {
            return Ok(None);
        }

        let name = head.shorthand().context("Branch name is not valid UTF-8")?;
        Ok(Some(BranchRef::local(name)))
    }

    /// Resolve the repository's default branch
    ///
    /// Follows `origin/HEAD` when the remote advertises one (preferring a
    /// local branch of the same name), and falls back to a local `main` or
    /// `master`.
    ///
    /// # Errors
    ///
    /// Returns an error if branch lookups fail for a reason other than the
    /// branch not existing
    pub fn default_branch(&self) -> Result<Option<BranchRef>> {
        if let Ok(reference) = self.repo.find_reference("refs/remotes/origin/HEAD")
            && let Some(target) = reference.symbolic_target()
            && let Some(name) = target.strip_prefix("refs/remotes/origin/")
        {
            if self.repo.find_branch(name, BranchType::Local).is_ok() {
                return Ok(Some(BranchRef::local(name)));
            }
            return Ok(Some(BranchRef {
                name: name.to_string(),
                full_name: target.to_string(),
                is_remote: true,
                remote: Some("origin".to_string()),
            }));
        }

        for name in ["main", "master"] {
            if self.repo.find_branch(name, BranchType::Local).is_ok() {
                return Ok(Some(BranchRef::local(name)));
            }
        }

        Ok(None)
    }

    /// Compute ahead/behind counts for a symmetric-difference range
    /// (e.g., `HEAD...feature`)
    ///
    /// Returns `None` when the range does not resolve, such as when either
    /// side names a branch that no longer exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit graph walk fails on a resolvable range
    pub fn ahead_behind(&self, range: &str) -> Result<Option<(usize, usize)>> {
        let Ok(revspec) = self.repo.revparse(range) else {
            return Ok(None);
        };

        let (Some(from), Some(to)) = (revspec.from(), revspec.to()) else {
            return Ok(None);
        };

        let (ahead, behind) = self
            .repo
            .graph_ahead_behind(from.id(), to.id())
            .with_context(|| format!("Failed to compute ahead/behind for '{range}'"))?;

        Ok(Some((ahead, behind)))
    }

    /// List all branches for the branch selector
    ///
    /// Returns branches sorted with:
    /// - "main" and "master" at the top (if they exist)
    /// - Local branches before remote branches
    /// - Within each section, sorted by most recent commit
    ///
    /// Symbolic `*/HEAD` remote references are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if branches cannot be listed
    pub fn list_for_selector(&self) -> Result<Vec<BranchRef>> {
        let mut local_branches = Vec::new();

        let branches = self
            .repo
            .branches(Some(BranchType::Local))
            .context("Failed to list local branches")?;

        for branch_result in branches {
            let (branch, _) = branch_result.context("Failed to read branch")?;
            if let Some(name) = branch.name().context("Branch name is not valid UTF-8")? {
                local_branches.push((BranchRef::local(name), commit_time(&branch)));
            }
        }

        let mut remote_branches = Vec::new();

        let branches = self
            .repo
            .branches(Some(BranchType::Remote))
            .context("Failed to list remote branches")?;

        for branch_result in branches {
            let (branch, _) = branch_result.context("Failed to read branch")?;
            if let Some(full_name) = branch.name().context("Branch name is not valid UTF-8")? {
                // Skip HEAD references like "origin/HEAD"
                if full_name.ends_with("/HEAD") {
                    continue;
                }

                // Parse remote name and branch name (e.g., "origin/main" -> ("origin", "main"))
                let parts: Vec<&str> = full_name.splitn(2, '/').collect();
                let (remote_name, branch_name) = if parts.len() == 2 {
                    (Some(parts[0].to_string()), parts[1].to_string())
                } else {
                    (None, full_name.to_string())
                };

                remote_branches.push((
                    BranchRef {
                        name: branch_name,
                        full_name: format!("refs/remotes/{full_name}"),
                        is_remote: true,
                        remote: remote_name,
                    },
                    commit_time(&branch),
                ));
            }
        }

        sort_for_selector(&mut local_branches);
        sort_for_selector(&mut remote_branches);

        let mut result: Vec<BranchRef> = local_branches
            .into_iter()
            .map(|(branch, _)| branch)
            .collect();
        result.extend(remote_branches.into_iter().map(|(branch, _)| branch));
        Ok(result)
    }
}

/// Last commit time on a branch (for sorting)
#[expect(clippy::cast_sign_loss, reason = "Checked secs >= 0 before cast")]
fn commit_time(branch: &git2::Branch<'_>) -> Option<SystemTime> {
    branch
        .get()
        .peel_to_commit()
        .ok()
        .map(|c| c.time())
        .and_then(|t| {
            let secs = t.seconds();
            if secs >= 0 {
                UNIX_EPOCH.checked_add(Duration::from_secs(secs as u64))
            } else {
                None
            }
        })
}

/// Sort branches: main/master first, then by most recent commit
fn sort_for_selector(branches: &mut [(BranchRef, Option<SystemTime>)]) {
    branches.sort_by(|a, b| {
        let a_priority = branch_priority(&a.0.name);
        let b_priority = branch_priority(&b.0.name);

        match b_priority.cmp(&a_priority) {
            std::cmp::Ordering::Equal => b.1.cmp(&a.1),
            other => other,
        }
    });
}

/// Get priority for branch name sorting (higher = comes first)
fn branch_priority(name: &str) -> u8 {
    match name {
        "main" => 2,
        "master" => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;
    use tempfile::TempDir;

    fn init_test_repo_with_commit() -> Result<(TempDir, Repository), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let repo = Repository::init(temp_dir.path())?;

        let sig = Signature::now("Test", "test@test.com")?;

        let file_path = temp_dir.path().join("README.md");
        fs::write(&file_path, "# Test")?;

        let mut index = repo.index()?;
        index.add_path(std::path::Path::new("README.md"))?;
        index.write()?;

        let tree_id = index.write_tree()?;

        {
            let tree = repo.find_tree(tree_id)?;
            repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])?;
        }

        Ok((temp_dir, repo))
    }

    fn commit_on_branch(
        repo: &Repository,
        temp_dir: &TempDir,
        branch_ref: &str,
        file: &str,
        content: &str,
    ) -> Result<git2::Oid, Box<dyn std::error::Error>> {
        let sig = Signature::now("Test", "test@test.com")?;

        fs::write(temp_dir.path().join(file), content)?;
        let mut index = repo.index()?;
        index.add_path(std::path::Path::new(file))?;
        index.write()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let parent = repo.revparse_single(branch_ref)?.peel_to_commit()?;
        let oid = repo.commit(
            Some(branch_ref),
            &sig,
            &sig,
            &format!("Update {file}"),
            &tree,
            &[&parent],
        )?;
        Ok(oid)
    }

    fn create_branch(repo: &Repository, name: &str) -> Result<(), Box<dyn std::error::Error>> {
        let commit = repo.head()?.peel_to_commit()?;
        repo.branch(name, &commit, false)?;
        Ok(())
    }

    #[test]
    fn test_branch_ref_identity() {
        let a = BranchRef::local("feature");
        let b = BranchRef::local("feature");
        let c = BranchRef {
            name: "feature".to_string(),
            full_name: "refs/remotes/origin/feature".to_string(),
            is_remote: true,
            remote: Some("origin".to_string()),
        };

        // Same identity compares equal; same name under a different ref does not.
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_branch_ref_local() {
        let branch = BranchRef::local("feature/test");
        assert_eq!(branch.name, "feature/test");
        assert_eq!(branch.full_name, "refs/heads/feature/test");
        assert!(!branch.is_remote);
        assert!(branch.remote.is_none());
    }

    #[test]
    fn test_current_branch() -> Result<(), Box<dyn std::error::Error>> {
        let (_temp_dir, repo) = init_test_repo_with_commit()?;
        let manager = Manager::new(&repo);

        let current = manager.current()?.ok_or("expected a current branch")?;
        assert!(!current.name.is_empty());
        assert!(current.full_name.starts_with("refs/heads/"));
        Ok(())
    }

    #[test]
    fn test_current_branch_detached() -> Result<(), Box<dyn std::error::Error>> {
        let (_temp_dir, repo) = init_test_repo_with_commit()?;

        let commit = repo.head()?.peel_to_commit()?;
        repo.set_head_detached(commit.id())?;

        let manager = Manager::new(&repo);
        assert!(manager.current()?.is_none());
        Ok(())
    }

    #[test]
    fn test_current_branch_unborn() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let repo = Repository::init(temp_dir.path())?;

        let manager = Manager::new(&repo);
        assert!(manager.current()?.is_none());
        Ok(())
    }

    #[test]
    fn test_default_branch_falls_back_to_local() -> Result<(), Box<dyn std::error::Error>> {
        let (_temp_dir, repo) = init_test_repo_with_commit()?;
        create_branch(&repo, "main")?;

        let manager = Manager::new(&repo);
        let default = manager.default_branch()?.ok_or("expected a default branch")?;
        assert_eq!(default.name, "main");
        assert!(!default.is_remote);
        Ok(())
    }

    #[test]
    fn test_default_branch_none_without_candidates() -> Result<(), Box<dyn std::error::Error>> {
        let (_temp_dir, repo) = init_test_repo_with_commit()?;

        let manager = Manager::new(&repo);
        let current = manager.current()?.ok_or("expected a current branch")?;

        // The freshly-initialized branch may itself be main/master; only a
        // repo without either has no default.
        let default = manager.default_branch()?;
        if current.name == "main" || current.name == "master" {
            assert_eq!(default.map(|b| b.name), Some(current.name));
        } else {
            assert!(default.is_none());
        }
        Ok(())
    }

    #[test]
    fn test_ahead_behind_counts_new_commits() -> Result<(), Box<dyn std::error::Error>> {
        let (temp_dir, repo) = init_test_repo_with_commit()?;
        create_branch(&repo, "feature")?;
        commit_on_branch(&repo, &temp_dir, "refs/heads/feature", "a.txt", "one")?;
        commit_on_branch(&repo, &temp_dir, "refs/heads/feature", "b.txt", "two")?;

        let manager = Manager::new(&repo);
        let (ahead, behind) = manager
            .ahead_behind("HEAD...feature")?
            .ok_or("expected the range to resolve")?;
        assert_eq!(ahead, 0);
        assert_eq!(behind, 2);
        Ok(())
    }

    #[test]
    fn test_ahead_behind_unresolvable_range() -> Result<(), Box<dyn std::error::Error>> {
        let (_temp_dir, repo) = init_test_repo_with_commit()?;

        let manager = Manager::new(&repo);
        assert!(manager.ahead_behind("HEAD...no-such-branch")?.is_none());
        Ok(())
    }

    #[test]
    fn test_list_for_selector() -> Result<(), Box<dyn std::error::Error>> {
        let (_temp_dir, repo) = init_test_repo_with_commit()?;
        create_branch(&repo, "feature/a")?;
        create_branch(&repo, "main")?;
        create_branch(&repo, "develop")?;

        let manager = Manager::new(&repo);
        let branches = manager.list_for_selector()?;

        assert!(!branches.is_empty());

        let main_idx = branches.iter().position(|b| b.name == "main");
        let feature_idx = branches.iter().position(|b| b.name == "feature/a");

        // main should come before feature branches (due to priority)
        if let (Some(main_i), Some(feature_i)) = (main_idx, feature_idx) {
            assert!(
                main_i < feature_i,
                "main should be sorted before feature branches"
            );
        }

        for branch in &branches {
            if branch.full_name.starts_with("refs/heads/") {
                assert!(!branch.is_remote);
                assert!(branch.remote.is_none());
            }
        }

        Ok(())
    }

    #[test]
    fn test_list_for_selector_local_before_remote() -> Result<(), Box<dyn std::error::Error>> {
        let (_temp_dir, repo) = init_test_repo_with_commit()?;
        let manager = Manager::new(&repo);

        let branches = manager.list_for_selector()?;

        let first_remote_idx = branches.iter().position(|b| b.is_remote);

        if let Some(remote_idx) = first_remote_idx {
            for branch in &branches[..remote_idx] {
                assert!(
                    !branch.is_remote,
                    "Local branches should come before remote"
                );
            }
        }

        Ok(())
    }

    #[test]
    fn test_branch_priority() {
        assert_eq!(branch_priority("main"), 2);
        assert_eq!(branch_priority("master"), 1);
        assert_eq!(branch_priority("feature"), 0);
        assert_eq!(branch_priority("develop"), 0);
        assert_eq!(branch_priority("main-feature"), 0);
    }

    #[test]
    fn test_manager_debug() -> Result<(), Box<dyn std::error::Error>> {
        let (_temp_dir, repo) = init_test_repo_with_commit()?;
        let manager = Manager::new(&repo);

        let debug = format!("{manager:?}");
        assert!(debug.contains("Manager"));
        Ok(())
    }
}

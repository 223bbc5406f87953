//! # Version Control Capabilities
//!
//! The core never shells out to git directly. Everything it needs from a
//! version control system goes through the [`GitOperations`] trait, which
//! keeps the repository cache, the commit resolver and the versioning loop
//! testable with an in-memory implementation.
//!
//! The operations fall into three groups:
//!
//! - **Remote queries**: resolving branch tips advertised by a remote.
//! - **History queries** on a local mirror: commit existence, commit ranges,
//!   file contents and metadata at a commit.
//! - **Branch maintenance** on a working clone: the handful of steps the
//!   versioning loop needs to record a new snapshot on its output branch.
//!
//! [`DefaultGitOperations`] binds every operation to the system `git` command
//! through [`crate::git`].

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::git::{self, CommitMetadata};

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Resolve a reference (branch, remote-tracking branch, `HEAD`) to a
    /// commit id.
    fn resolve_ref(&self, repo: &Path, reference: &str) -> Result<String>;

    /// Branch tips advertised by the remote at `url` that match `pattern`.
    fn list_remote_heads(&self, url: &str, pattern: &str) -> Result<BTreeMap<String, String>>;

    /// Create a bare mirror clone of `url` at `dest`.
    fn clone_mirror(&self, url: &str, dest: &Path) -> Result<()>;

    /// Clone `url` into `dest` without checking out a working tree.
    fn clone_working(&self, url: &str, dest: &Path) -> Result<()>;

    /// Refresh a clone from its remote, pruning stale refs.
    fn fetch(&self, repo: &Path) -> Result<()>;

    /// Whether `id` is a commit present in the repository. Never fails.
    fn commit_exists(&self, repo: &Path, id: &str) -> bool;

    /// Commit ids reachable from `to` but not from `from`, oldest first.
    fn log_range(&self, repo: &Path, from: &str, to: &str) -> Result<Vec<String>>;

    /// Content of `filename` as of commit `id`.
    fn read_file_at_commit(&self, repo: &Path, id: &str, filename: &str) -> Result<Vec<u8>>;

    /// Author, message, timestamp and changed paths of a single commit.
    fn commit_metadata(&self, repo: &Path, id: &str) -> Result<CommitMetadata>;

    /// Set the identity used for commits made in `repo`.
    fn set_identity(&self, repo: &Path, name: &str, email: &str) -> Result<()>;

    /// Whether `origin/<branch>` exists in the clone. Never fails.
    fn remote_branch_exists(&self, repo: &Path, branch: &str) -> bool;

    /// Switch to a new `branch` with no history and an empty index.
    fn checkout_orphan_branch(&self, repo: &Path, branch: &str) -> Result<()>;

    /// Switch to `branch` and force it to match `origin/<branch>`.
    fn reset_branch_to_remote(&self, repo: &Path, branch: &str) -> Result<()>;

    /// Stage a file of the working tree.
    fn stage_file(&self, repo: &Path, filename: &str) -> Result<()>;

    /// Whether the index differs from the current commit.
    fn has_staged_changes(&self, repo: &Path) -> Result<bool>;

    /// Commit the index.
    fn commit(&self, repo: &Path, message: &str) -> Result<()>;

    /// Push `branch` to `origin`.
    fn push_branch(&self, repo: &Path, branch: &str) -> Result<()>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn resolve_ref(&self, repo: &Path, reference: &str) -> Result<String> {
        git::resolve_ref(repo, reference)
    }

    fn list_remote_heads(&self, url: &str, pattern: &str) -> Result<BTreeMap<String, String>> {
        git::list_remote_heads(url, pattern)
    }

    fn clone_mirror(&self, url: &str, dest: &Path) -> Result<()> {
        git::clone_mirror(url, dest)
    }

    fn clone_working(&self, url: &str, dest: &Path) -> Result<()> {
        git::clone(url, dest, None, true)
    }

    fn fetch(&self, repo: &Path) -> Result<()> {
        git::fetch_prune(repo)
    }

    fn commit_exists(&self, repo: &Path, id: &str) -> bool {
        git::commit_exists(repo, id)
    }

    fn log_range(&self, repo: &Path, from: &str, to: &str) -> Result<Vec<String>> {
        git::log_range(repo, from, to)
    }

    fn read_file_at_commit(&self, repo: &Path, id: &str, filename: &str) -> Result<Vec<u8>> {
        git::read_file_at_commit(repo, id, filename)
    }

    fn commit_metadata(&self, repo: &Path, id: &str) -> Result<CommitMetadata> {
        git::commit_metadata(repo, id)
    }

    fn set_identity(&self, repo: &Path, name: &str, email: &str) -> Result<()> {
        git::set_config(repo, "user.name", name)?;
        git::set_config(repo, "user.email", email)
    }

    fn remote_branch_exists(&self, repo: &Path, branch: &str) -> bool {
        git::branch_exists(repo, branch, true)
    }

    fn checkout_orphan_branch(&self, repo: &Path, branch: &str) -> Result<()> {
        git::checkout_orphan(repo, branch)
    }

    fn reset_branch_to_remote(&self, repo: &Path, branch: &str) -> Result<()> {
        git::reset_to_remote(repo, branch)
    }

    fn stage_file(&self, repo: &Path, filename: &str) -> Result<()> {
        git::add(repo, filename)
    }

    fn has_staged_changes(&self, repo: &Path) -> Result<bool> {
        Ok(git::has_staged_changes(repo))
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<()> {
        git::commit(repo, message)
    }

    fn push_branch(&self, repo: &Path, branch: &str) -> Result<()> {
        git::push(repo, "origin", branch)
    }
}

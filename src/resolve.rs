//! # Commit Resolution
//!
//! Turns two revisions of a view repository into the list of commits that
//! lead from one to the other, across the view repository itself and every
//! repository whose pinned revision moved in between.
//!
//! ## Process
//!
//! 1.  Read the manifest at both view revisions straight from the cached
//!     mirror of the view repository.
//! 2.  Diff the manifests. Every changed directory that still follows the same
//!     branch of the same repository becomes a task covering the old and new
//!     revision. Added and removed entries, and entries that switched URL or
//!     branch, produce no task of their own.
//! 3.  Add a final task for the view repository between the two revisions.
//! 4.  List the commits of every task, oldest first, and concatenate them in
//!     task order: sub-repositories in diff order (lexicographic by
//!     directory), the view repository last.
//! 5.  Load metadata and changed paths for each commit.
//!
//! Commits are grouped by repository; there is no chronological interleaving
//! across repositories.

use serde::Serialize;

use crate::cache::RepoCache;
use crate::diff;
use crate::error::Result;
use crate::manifest::{self, Manifest, DEFAULT_FILENAME};

/// A single change unit produced by commit resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    /// Paths changed by the commit, relative to its repository.
    pub filenames: Vec<String>,
    pub author: String,
    pub repository: String,
    pub branch: String,
    /// Commit id after the change.
    pub revision: String,
    pub message: String,
    /// Seconds since the epoch.
    pub timestamp: i64,
    /// View repository that pinned this commit, absent for commits to the view
    /// repository itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_branch: Option<String>,
}

/// A commit id together with the repository and branch it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    pub url: String,
    pub branch: String,
    pub id: String,
}

/// A repository range that has to be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeTask {
    pub url: String,
    pub branch: String,
    pub old: String,
    pub new: String,
}

/// Resolves view revisions into commit lists using a [`RepoCache`].
pub struct CommitResolver<'a> {
    cache: &'a RepoCache,
}

impl<'a> CommitResolver<'a> {
    pub fn new(cache: &'a RepoCache) -> Self {
        Self { cache }
    }

    /// Read the view manifest of `url` as of `revision`.
    pub fn read_manifest(&self, url: &str, revision: &str) -> Result<Manifest> {
        let bytes = self.cache.read_file(url, revision, DEFAULT_FILENAME)?;
        manifest::parse_bytes(&bytes, &format!("{}@{}", DEFAULT_FILENAME, revision))
    }

    /// The repository ranges that make up the change from `old` to `new`.
    pub fn range_tasks(
        &self,
        view_url: &str,
        view_branch: &str,
        old: &str,
        new: &str,
    ) -> Result<Vec<RangeTask>> {
        self.cache.ensure(view_url, &[old, new])?;
        let old_view = self.read_manifest(view_url, old)?;
        let new_view = self.read_manifest(view_url, new)?;

        let mut tasks: Vec<RangeTask> = diff::diff(&old_view, &new_view)
            .into_values()
            .filter(|change| change.is_rebase())
            .filter_map(|change| match (change.old, change.new) {
                (Some(old_entry), Some(new_entry)) => Some(RangeTask {
                    url: old_entry.url,
                    branch: old_entry.branch,
                    old: old_entry.revision,
                    new: new_entry.revision,
                }),
                _ => None,
            })
            .collect();

        tasks.push(RangeTask {
            url: view_url.to_string(),
            branch: view_branch.to_string(),
            old: old.to_string(),
            new: new.to_string(),
        });
        Ok(tasks)
    }

    /// Commit ids between two view revisions, grouped by repository.
    pub fn commit_ids(
        &self,
        view_url: &str,
        view_branch: &str,
        old: &str,
        new: &str,
    ) -> Result<Vec<CommitRef>> {
        let mut commits = Vec::new();
        for task in self.range_tasks(view_url, view_branch, old, new)? {
            let ids = self.cache.commits_between(&task.url, &task.old, &task.new)?;
            commits.extend(ids.into_iter().map(|id| CommitRef {
                url: task.url.clone(),
                branch: task.branch.clone(),
                id,
            }));
        }
        Ok(commits)
    }

    /// Detailed commits between two view revisions.
    pub fn commits(
        &self,
        view_url: &str,
        view_branch: &str,
        old: &str,
        new: &str,
    ) -> Result<Vec<Commit>> {
        self.commit_ids(view_url, view_branch, old, new)?
            .into_iter()
            .map(|commit| self.describe(view_url, view_branch, commit))
            .collect()
    }

    fn describe(&self, view_url: &str, view_branch: &str, commit: CommitRef) -> Result<Commit> {
        let metadata = self.cache.commit_metadata(&commit.url, &commit.id)?;
        let is_view_commit = commit.url == view_url && commit.branch == view_branch;
        let (parent_repository, parent_branch) = if is_view_commit {
            (None, None)
        } else {
            (Some(view_url.to_string()), Some(view_branch.to_string()))
        };
        Ok(Commit {
            filenames: metadata.changed_files,
            author: metadata.author,
            repository: commit.url,
            branch: commit.branch,
            revision: commit.id,
            message: metadata.message,
            timestamp: metadata.timestamp,
            parent_repository,
            parent_branch,
        })
    }
}

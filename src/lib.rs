//! # Repository View Library
//!
//! This library provides the core functionality for working with "views": a
//! manifest (`view.txt`) stored in a git repository that lists other git
//! repositories, the directory each one lives in, and the branch or revision
//! it is checked out at. It is designed to be used by the `repo-view`
//! command-line tool but can also be integrated into other applications that
//! need to follow changes across many repositories.
//!
//! ## Quick Example
//!
//! ```
//! use repo_view::diff::{diff, ChangeKind};
//! use repo_view::manifest;
//!
//! let old = manifest::parse("foo git://foo/foo GIT master HEAD\n", "old").unwrap();
//! let new = manifest::parse(
//!     "foo git://foo/foo GIT master 7783ac32d05162f328bba0d64e56b80a9f15bb17\n",
//!     "new",
//! )
//! .unwrap();
//!
//! let changes = diff(&old, &new);
//! assert_eq!(changes.len(), 1);
//! assert_eq!(changes["foo"].kind(), ChangeKind::Changed);
//! assert!(changes["foo"].is_rebase());
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifest (`manifest`, `diff`)**: Parsing, serialising and comparing
//!   view manifests.
//! - **Repository Management (`repository`, `git`, `cache`)**: All version
//!   control access goes through the `GitOperations` trait; `RepoCache` keeps
//!   bare mirrors of every repository that has to be queried.
//! - **Commit Resolution (`resolve`)**: Turns two revisions of a view into the
//!   ordered list of commits that happened in between, across every
//!   repository whose pinned revision moved.
//! - **Versioning Loop (`poller`, `notify`)**: Periodically pins every
//!   floating entry of a view to a concrete commit, records the result on an
//!   output branch, and reports each new snapshot.
//! - **Workspace (`workspace`)**: Cloning, updating, inspecting and cleaning
//!   a view checked out on disk.
//! - **Configuration (`config`, `defaults`)**: Poller settings and shared
//!   default values.
//!
//! ## Versioning Flow
//!
//! 1.  **Poll**: `Poller` fetches the view, pins its floating entries and
//!     commits the pinned manifest to `versioned/<branch>` when it changed.
//! 2.  **Resolve**: the listener runs `CommitResolver` between the previous
//!     and the new snapshot, which yields the commits of every moved
//!     repository followed by the snapshots themselves.
//! 3.  **Notify**: a `Notifier` hands the commits to whatever consumes them.

pub mod cache;
pub mod config;
pub mod defaults;
pub mod diff;
pub mod error;
pub mod git;
pub mod manifest;
pub mod notify;
pub mod poller;
pub mod repository;
pub mod resolve;
pub mod workspace;

#[cfg(test)]
mod manifest_proptest;
#[cfg(test)]
mod test_support;

//! Default values for repo-view configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Default number of seconds between two polls of a view repository.
pub const POLL_INTERVAL_SECS: u64 = 60;

/// Branch of the view repository tracked when none is given.
pub const BRANCH: &str = "master";

/// Prefix prepended to the tracked branch to name the output branch.
pub const OUTPUT_PREFIX: &str = "versioned/";

/// Reserved directory of the synthetic entry that records which view
/// revision a pinned snapshot was produced from.
pub const UNVERSIONED_VIEW_DIRECTORY: &str = ".unversioned_view";

/// Identity used for automatic snapshot commits.
pub const COMMITTER_NAME: &str = "repo-view";
pub const COMMITTER_EMAIL: &str = "noreply@example.com";

/// Message of automatic snapshot commits.
pub const COMMIT_MESSAGE: &str = "Automatic commit";

/// Returns the default cache root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/repo-view` (XDG Base Directory)
/// - macOS: `~/Library/Caches/repo-view`
/// - Windows: `{FOLDERID_LocalAppData}\repo-view`
///
/// Falls back to `.repo-view-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `REPO_VIEW_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("repo-view"))
        .unwrap_or_else(|| PathBuf::from(".repo-view-cache"))
}

/// Name of the output branch for `branch` under `prefix`.
pub fn output_branch(prefix: &str, branch: &str) -> String {
    format!("{}{}", prefix, branch)
}

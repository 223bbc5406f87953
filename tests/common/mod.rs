//! Shared test utilities for integration and E2E tests.
//!
//! This module provides fixtures that build real git repositories in a
//! temporary directory, so the tests exercise the same `git` binary the tool
//! uses in production. Tests that need git should bail out early when
//! [`git_available`] returns `false`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     if !git_available() {
//!         return;
//!     }
//!     let fixture = TestFixture::new();
//!     let repo = fixture.upstream("foo");
//!     let id = repo.commit_file("README", "hello", "initial");
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{git, git_available, TestFixture, Upstream};
}

/// Whether a usable `git` binary is on the path.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Run git in `dir` with a fixed identity, panicking on failure. Returns the
/// trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A local repository used as the remote of a test.
pub struct Upstream {
    path: PathBuf,
}

impl Upstream {
    /// Initialise an empty repository with `master` as its default branch.
    pub fn init(path: &Path) -> Self {
        fs::create_dir_all(path).expect("Failed to create upstream directory");
        git(path, &["init", "-q"]);
        git(path, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// URL other repositories use to reach this one.
    pub fn url(&self) -> String {
        self.path.display().to_string()
    }

    /// Write `name`, commit it on the current branch and return the new id.
    pub fn commit_file(&self, name: &str, content: &str, message: &str) -> String {
        let file = self.path.join(name);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file, content).expect("Failed to write file");
        git(&self.path, &["add", "--", name]);
        git(&self.path, &["commit", "-q", "-m", message]);
        self.head()
    }

    pub fn head(&self) -> String {
        git(&self.path, &["rev-parse", "HEAD"])
    }

    /// Tip of `branch`, if it exists.
    pub fn branch_tip(&self, branch: &str) -> Option<String> {
        let reference = format!("refs/heads/{}", branch);
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "-q", &reference])
            .current_dir(&self.path)
            .output()
            .ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// A test fixture that provides a temporary directory for views, upstream
/// repositories and caches.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new().with_view_file("foo git://x/foo GIT master HEAD\n");
///
/// let mut cmd = fixture.command();
/// cmd.arg("status").assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `view.txt` manifest at the root of the fixture.
    pub fn with_view_file(self, content: &str) -> Self {
        self.with_file("view.txt", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create an upstream repository under `upstream/<name>`.
    pub fn upstream(&self, name: &str) -> Upstream {
        Upstream::init(&self.path().join("upstream").join(name))
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("repo-view");
        cmd.current_dir(self.path());
        cmd.env_remove("REPO_VIEW_CACHE");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_view_file() {
        let fixture = TestFixture::new().with_view_file("a git://x/a GIT master HEAD\n");
        assert!(fixture.path().join("view.txt").exists());
    }

    #[test]
    fn test_upstream_commits() {
        if !git_available() {
            return;
        }
        let fixture = TestFixture::new();
        let repo = fixture.upstream("foo");
        let first = repo.commit_file("a.txt", "1", "first");
        let second = repo.commit_file("dir/b.txt", "2", "second");
        assert_ne!(first, second);
        assert_eq!(repo.branch_tip("master"), Some(second));
        assert_eq!(repo.branch_tip("missing"), None);
    }
}

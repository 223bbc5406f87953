//! On-disk cache of repository mirrors
//!
//! Every upstream repository gets one bare mirror under the cache root. The
//! mirror path is the hex encoding of the URL, which is deterministic,
//! collision-free and safe on any filesystem. Keys longer than
//! [`SEGMENT_LEN`] are split into nested directories so no path component
//! exceeds common file name limits; every directory but the last carries a
//! trailing `+`, which is not a hex digit and so never names a mirror.
//!
//! [`RepoCache::ensure`] guarantees that a set of commits can be queried while
//! touching the network as little as possible:
//!
//! 1. an existing mirror that already has every commit is used as is;
//! 2. otherwise an existing mirror is fetched (pruning stale refs) and used if
//!    that was enough;
//! 3. otherwise the mirror is discarded and cloned again from scratch. A fresh
//!    clone that still lacks a commit is reported as
//!    [`Error::CacheInconsistency`].
//!
//! Concurrent use of one cache root by several processes is not coordinated;
//! callers that share a root must serialize access themselves.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::git::CommitMetadata;
use crate::repository::GitOperations;

/// Longest run of hex digits in one path component.
pub const SEGMENT_LEN: usize = 200;

/// Marks a directory that continues a longer key.
const CONTINUATION: char = '+';

/// Path of the mirror of `url`, relative to the cache root.
fn key_path(url: &str) -> PathBuf {
    let key = hex::encode(url.as_bytes());
    let mut path = PathBuf::new();
    let mut rest = key.as_str();
    while rest.len() > SEGMENT_LEN {
        let (segment, tail) = rest.split_at(SEGMENT_LEN);
        path.push(format!("{}{}", segment, CONTINUATION));
        rest = tail;
    }
    if rest.is_empty() {
        // Never let the empty URL resolve to the cache root itself.
        path.push(CONTINUATION.to_string());
    } else {
        path.push(rest);
    }
    path
}

/// A mirror found in the cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMirror {
    pub url: String,
    pub path: PathBuf,
}

/// Cache of bare mirrors keyed by repository URL.
pub struct RepoCache {
    root: PathBuf,
    git: Arc<dyn GitOperations>,
    // Held for its Drop: a temporary cache is removed with the RepoCache.
    _temporary: Option<TempDir>,
}

impl RepoCache {
    /// Create a cache rooted at `root`. The directory is created on first use
    /// and never removed by the cache.
    pub fn new(root: impl Into<PathBuf>, git: Arc<dyn GitOperations>) -> Self {
        Self {
            root: root.into(),
            git,
            _temporary: None,
        }
    }

    /// Create a cache in a fresh temporary directory that is deleted when the
    /// cache is dropped, including on error paths.
    pub fn temporary(git: Arc<dyn GitOperations>) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("repo-view-cache").tempdir()?;
        Ok(Self {
            root: dir.path().to_path_buf(),
            git,
            _temporary: Some(dir),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn git(&self) -> &dyn GitOperations {
        self.git.as_ref()
    }

    /// Local mirror path for `url`.
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(key_path(url))
    }

    fn has_all(&self, path: &Path, required: &[&str]) -> bool {
        required.iter().all(|id| self.git.commit_exists(path, id))
    }

    fn missing(&self, path: &Path, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|id| !self.git.commit_exists(path, id))
            .map(|id| id.to_string())
            .collect()
    }

    /// Make sure a mirror of `url` exists locally and contains every commit in
    /// `required`. Returns the mirror path.
    pub fn ensure(&self, url: &str, required: &[&str]) -> Result<PathBuf> {
        let path = self.path_for(url);

        if path.exists() {
            if self.has_all(&path, required) {
                debug!("Cache hit for {}", url);
                return Ok(path);
            }

            debug!("Fetching {} into {}", url, path.display());
            match self.git.fetch(&path) {
                Ok(()) if self.has_all(&path, required) => return Ok(path),
                Ok(()) => debug!("Fetch of {} did not provide all commits", url),
                Err(e) => warn!("Fetch of {} failed, recloning: {}", url, e),
            }
            fs::remove_dir_all(&path)?;
        }

        info!("Cloning {} into cache...", url);
        self.git.clone_mirror(url, &path)?;

        let missing = self.missing(&path, required);
        if !missing.is_empty() {
            return Err(Error::CacheInconsistency {
                url: url.to_string(),
                missing,
            });
        }
        Ok(path)
    }

    /// Commits of `url` reachable from `new` but not from `old`, oldest first.
    pub fn commits_between(&self, url: &str, old: &str, new: &str) -> Result<Vec<String>> {
        let path = self.ensure(url, &[old, new])?;
        self.git.log_range(&path, old, new)
    }

    /// Content of `filename` at commit `id` of `url`.
    pub fn read_file(&self, url: &str, id: &str, filename: &str) -> Result<Vec<u8>> {
        let path = self.ensure(url, &[id])?;
        self.git.read_file_at_commit(&path, id, filename)
    }

    /// Metadata of commit `id` of `url`, without walking history.
    pub fn commit_metadata(&self, url: &str, id: &str) -> Result<CommitMetadata> {
        let path = self.ensure(url, &[id])?;
        self.git.commit_metadata(&path, id)
    }

    /// Mirrors currently present in the cache directory, sorted by URL.
    ///
    /// Directories whose names do not decode to a URL are skipped.
    pub fn entries(&self) -> Result<Vec<CachedMirror>> {
        let mut mirrors = Vec::new();
        if self.root.exists() {
            collect_mirrors(&self.root, "", &mut mirrors)?;
        }
        mirrors.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(mirrors)
    }

    /// Delete the mirror of `url`. Returns whether one existed.
    pub fn remove(&self, url: &str) -> Result<bool> {
        let path = self.path_for(url);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&path)?;

        // Drop continuation directories the removal left empty.
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir == self.root || fs::read_dir(dir)?.next().is_some() {
                break;
            }
            fs::remove_dir(dir)?;
            parent = dir.parent();
        }
        Ok(true)
    }
}

fn collect_mirrors(dir: &Path, prefix: &str, mirrors: &mut Vec<CachedMirror>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(segment) = name.strip_suffix(CONTINUATION) {
            if !segment.is_empty() {
                collect_mirrors(&entry.path(), &format!("{}{}", prefix, segment), mirrors)?;
            }
            continue;
        }
        let decoded = hex::decode(format!("{}{}", prefix, name))
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok());
        if let Some(url) = decoded {
            mirrors.push(CachedMirror {
                url,
                path: entry.path(),
            });
        }
    }
    Ok(())
}

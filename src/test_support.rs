//! In-memory git used by unit tests.
//!
//! `FakeGit` keeps a set of remotes (url -> branches) over one shared commit
//! store with linear parent links, and tracks local clones by path. Clones
//! only see commits that were reachable on the remote when they were last
//! cloned or fetched, which is what the repository cache relies on. Counters
//! record how often the network was touched.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::git::CommitMetadata;
use crate::repository::GitOperations;

#[derive(Debug, Clone)]
pub struct FakeCommit {
    pub parent: Option<String>,
    pub author: String,
    pub message: String,
    pub timestamp: i64,
    pub files: BTreeMap<String, Vec<u8>>,
    pub changed: Vec<String>,
}

#[derive(Debug, Default)]
struct FakeClone {
    url: String,
    known: HashSet<String>,
    tracking: BTreeMap<String, String>,
    head: Option<String>,
    index: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Default)]
struct State {
    commits: HashMap<String, FakeCommit>,
    remotes: HashMap<String, BTreeMap<String, String>>,
    clones: HashMap<PathBuf, FakeClone>,
    next_id: usize,
    clone_calls: usize,
    fetch_calls: usize,
    push_calls: usize,
    fail_fetches: bool,
}

impl State {
    fn ancestors(&self, tip: &str) -> Vec<String> {
        let mut ids = Vec::new();
        let mut current = Some(tip.to_string());
        while let Some(id) = current {
            current = self.commits.get(&id).and_then(|c| c.parent.clone());
            ids.push(id);
        }
        ids
    }

    fn reachable(&self, url: &str) -> HashSet<String> {
        self.remotes
            .get(url)
            .map(|branches| {
                branches
                    .values()
                    .flat_map(|tip| self.ancestors(tip))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn new_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:040x}", self.next_id)
    }

    fn clone_at(&mut self, repo: &Path) -> Result<&mut FakeClone> {
        self.clones.get_mut(repo).ok_or_else(|| missing(repo))
    }
}

fn missing(repo: &Path) -> Error {
    Error::GitCommand {
        command: "fake".to_string(),
        target: repo.display().to_string(),
        stderr: "not a git repository".to_string(),
    }
}

#[derive(Debug, Default)]
pub struct FakeGit {
    state: Mutex<State>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commit to `branch` of the remote at `url` and return its id.
    pub fn commit_to(&self, url: &str, branch: &str, files: &[(&str, &str)], message: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let parent = state
            .remotes
            .get(url)
            .and_then(|branches| branches.get(branch))
            .cloned();
        let mut snapshot = parent
            .as_ref()
            .and_then(|p| state.commits.get(p))
            .map(|c| c.files.clone())
            .unwrap_or_default();
        for (name, content) in files {
            snapshot.insert(name.to_string(), content.as_bytes().to_vec());
        }
        let id = state.new_id();
        let timestamp = 1_700_000_000 + state.next_id as i64;
        state.commits.insert(
            id.clone(),
            FakeCommit {
                parent,
                author: "Test Author <test@example.com>".to_string(),
                message: message.to_string(),
                timestamp,
                files: snapshot,
                changed: files.iter().map(|(name, _)| name.to_string()).collect(),
            },
        );
        state
            .remotes
            .entry(url.to_string())
            .or_default()
            .insert(branch.to_string(), id.clone());
        id
    }

    pub fn branch_tip(&self, url: &str, branch: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.remotes.get(url).and_then(|b| b.get(branch)).cloned()
    }

    pub fn commit_info(&self, id: &str) -> Option<FakeCommit> {
        self.state.lock().unwrap().commits.get(id).cloned()
    }

    pub fn clone_calls(&self) -> usize {
        self.state.lock().unwrap().clone_calls
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().unwrap().fetch_calls
    }

    /// Make every later fetch fail until switched off again.
    pub fn set_fetch_failure(&self, fail: bool) {
        self.state.lock().unwrap().fail_fetches = fail;
    }

    pub fn push_calls(&self) -> usize {
        self.state.lock().unwrap().push_calls
    }
}

impl GitOperations for FakeGit {
    fn resolve_ref(&self, repo: &Path, reference: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        let clone = state.clones.get(repo).ok_or_else(|| missing(repo))?;
        let resolved = if reference == "HEAD" {
            clone.head.clone()
        } else if let Some(branch) = reference.strip_prefix("origin/") {
            clone.tracking.get(branch).cloned()
        } else {
            clone.tracking.get(reference).cloned()
        };
        resolved.ok_or_else(|| Error::GitCommand {
            command: format!("rev-parse {}", reference),
            target: repo.display().to_string(),
            stderr: "unknown revision".to_string(),
        })
    }

    fn list_remote_heads(&self, url: &str, pattern: &str) -> Result<BTreeMap<String, String>> {
        let state = self.state.lock().unwrap();
        let branches = state.remotes.get(url).ok_or_else(|| Error::GitCommand {
            command: "ls-remote".to_string(),
            target: url.to_string(),
            stderr: "repository not found".to_string(),
        })?;
        Ok(branches
            .iter()
            .filter(|(name, _)| name.as_str() == pattern)
            .map(|(name, id)| (name.clone(), id.clone()))
            .collect())
    }

    fn clone_mirror(&self, url: &str, dest: &Path) -> Result<()> {
        self.clone_working(url, dest)
    }

    fn clone_working(&self, url: &str, dest: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.clone_calls += 1;
        let tracking = state.remotes.get(url).cloned().ok_or_else(|| Error::GitCommand {
            command: "clone".to_string(),
            target: url.to_string(),
            stderr: "repository not found".to_string(),
        })?;
        fs::create_dir_all(dest)?;
        let known = state.reachable(url);
        state.clones.insert(
            dest.to_path_buf(),
            FakeClone {
                url: url.to_string(),
                known,
                tracking,
                ..FakeClone::default()
            },
        );
        Ok(())
    }

    fn fetch(&self, repo: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        if state.fail_fetches {
            return Err(Error::GitCommand {
                command: "fetch".to_string(),
                target: repo.display().to_string(),
                stderr: "could not read from remote repository".to_string(),
            });
        }
        let url = state.clone_at(repo)?.url.clone();
        let tracking = state.remotes.get(&url).cloned().unwrap_or_default();
        let reachable = state.reachable(&url);
        let clone = state.clone_at(repo)?;
        clone.tracking = tracking;
        clone.known.extend(reachable);
        Ok(())
    }

    fn commit_exists(&self, repo: &Path, id: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .clones
            .get(repo)
            .map(|clone| clone.known.contains(id))
            .unwrap_or(false)
    }

    fn log_range(&self, repo: &Path, from: &str, to: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        state.clones.get(repo).ok_or_else(|| missing(repo))?;
        let excluded: HashSet<String> = state.ancestors(from).into_iter().collect();
        let mut ids: Vec<String> = state
            .ancestors(to)
            .into_iter()
            .take_while(|id| !excluded.contains(id))
            .collect();
        ids.reverse();
        Ok(ids)
    }

    fn read_file_at_commit(&self, repo: &Path, id: &str, filename: &str) -> Result<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state.clones.get(repo).ok_or_else(|| missing(repo))?;
        state
            .commits
            .get(id)
            .and_then(|c| c.files.get(filename))
            .cloned()
            .ok_or_else(|| Error::GitCommand {
                command: format!("show {}:{}", id, filename),
                target: repo.display().to_string(),
                stderr: "path does not exist".to_string(),
            })
    }

    fn commit_metadata(&self, repo: &Path, id: &str) -> Result<CommitMetadata> {
        let state = self.state.lock().unwrap();
        let commit = state.commits.get(id).ok_or_else(|| missing(repo))?;
        Ok(CommitMetadata {
            author: commit.author.clone(),
            message: commit.message.clone(),
            timestamp: commit.timestamp,
            changed_files: commit.changed.clone(),
        })
    }

    fn set_identity(&self, repo: &Path, _name: &str, _email: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.clone_at(repo)?;
        Ok(())
    }

    fn remote_branch_exists(&self, repo: &Path, branch: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .clones
            .get(repo)
            .map(|clone| clone.tracking.contains_key(branch))
            .unwrap_or(false)
    }

    fn checkout_orphan_branch(&self, repo: &Path, _branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let clone = state.clone_at(repo)?;
        clone.head = None;
        clone.index.clear();
        Ok(())
    }

    fn reset_branch_to_remote(&self, repo: &Path, branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let tip = state
            .clone_at(repo)?
            .tracking
            .get(branch)
            .cloned()
            .ok_or_else(|| missing(repo))?;
        let files = state
            .commits
            .get(&tip)
            .map(|c| c.files.clone())
            .unwrap_or_default();
        let clone = state.clone_at(repo)?;
        clone.head = Some(tip);
        clone.index = files;
        Ok(())
    }

    fn stage_file(&self, repo: &Path, filename: &str) -> Result<()> {
        let content = fs::read(repo.join(filename))?;
        let mut state = self.state.lock().unwrap();
        state
            .clone_at(repo)?
            .index
            .insert(filename.to_string(), content);
        Ok(())
    }

    fn has_staged_changes(&self, repo: &Path) -> Result<bool> {
        let state = self.state.lock().unwrap();
        let clone = state.clones.get(repo).ok_or_else(|| missing(repo))?;
        let committed = clone
            .head
            .as_ref()
            .and_then(|head| state.commits.get(head))
            .map(|c| c.files.clone());
        Ok(match committed {
            Some(files) => files != clone.index,
            None => true,
        })
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let (parent, files) = {
            let clone = state.clone_at(repo)?;
            (clone.head.clone(), clone.index.clone())
        };
        let id = state.new_id();
        let timestamp = 1_700_000_000 + state.next_id as i64;
        state.commits.insert(
            id.clone(),
            FakeCommit {
                parent,
                author: "repo-view <noreply@example.com>".to_string(),
                message: message.to_string(),
                timestamp,
                changed: files.keys().cloned().collect(),
                files,
            },
        );
        let clone = state.clone_at(repo)?;
        clone.head = Some(id.clone());
        clone.known.insert(id);
        Ok(())
    }

    fn push_branch(&self, repo: &Path, branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.push_calls += 1;
        let (url, head) = {
            let clone = state.clone_at(repo)?;
            (clone.url.clone(), clone.head.clone().ok_or_else(|| missing(repo))?)
        };
        state
            .remotes
            .entry(url)
            .or_default()
            .insert(branch.to_string(), head.clone());
        state
            .clone_at(repo)?
            .tracking
            .insert(branch.to_string(), head);
        Ok(())
    }
}

//! # Workspace Operations
//!
//! A view checked out on disk is a git clone of the view repository whose
//! `view.txt` lists the repositories to place under it. The functions here
//! keep those repositories in line with the manifest: cloning missing ones,
//! moving existing ones to their pinned revision or branch tip, reporting
//! local modifications and cleaning build output.
//!
//! Batch operations never stop at the first broken repository. Every failure
//! is collected in an [`UpdateReport`] and handed back together with the list
//! of repositories that were updated.
//!
//! Nested repositories are handled by checking out entries with fewer path
//! components first, so `libs` exists before `libs/core` is cloned into it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use log::{debug, info, warn};

use crate::diff;
use crate::error::{Error, Result};
use crate::git;
use crate::manifest::{Manifest, ManifestEntry, DEFAULT_FILENAME, VCS_GIT};

/// Whether `path` holds a view manifest.
pub fn is_view_directory(path: &Path) -> bool {
    path.join(DEFAULT_FILENAME).is_file()
}

/// The innermost directory at or above `start` that holds a view manifest.
pub fn find_enclosing_view(start: &Path) -> Option<PathBuf> {
    let start = fs::canonicalize(start).ok()?;
    start
        .ancestors()
        .find(|dir| is_view_directory(dir))
        .map(Path::to_path_buf)
}

/// Like [`find_enclosing_view`], failing with [`Error::NotInView`].
pub fn find_enclosing_view_checked(start: &Path) -> Result<PathBuf> {
    find_enclosing_view(start).ok_or_else(|| Error::NotInView {
        path: start.display().to_string(),
    })
}

/// Parse the manifest of the view at `viewdir`.
pub fn read_view(viewdir: &Path) -> Result<Manifest> {
    Manifest::from_file(&viewdir.join(DEFAULT_FILENAME))
}

/// Local state of one repository compared to its manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoStatus {
    Unchanged,
    Changed(String),
}

impl RepoStatus {
    pub fn is_changed(&self) -> bool {
        matches!(self, RepoStatus::Changed(_))
    }

    pub fn report(&self) -> &str {
        match self {
            RepoStatus::Unchanged => "has no changes",
            RepoStatus::Changed(reason) => reason,
        }
    }
}

fn changed(reason: &str) -> RepoStatus {
    RepoStatus::Changed(reason.to_string())
}

fn status_of(path: &Path, entry: &ManifestEntry) -> Result<RepoStatus> {
    if git::remote_url(path, "origin")? != entry.url {
        return Ok(changed("has changed origin"));
    }
    let revision = git::resolve_ref(path, "HEAD")?;
    if entry.has_pinned_revision() {
        if revision != entry.revision {
            return Ok(changed("has changed revision"));
        }
    } else {
        let branch = git::current_branch(path, "HEAD")?;
        if branch != entry.branch {
            return Ok(changed("has changed branch"));
        }
        let upstream = git::resolve_ref(path, &format!("origin/{}", branch))?;
        if revision != upstream {
            return Ok(changed("has unpushed changes"));
        }
    }
    if git::has_staged_changes(path) {
        return Ok(changed("has staged changes"));
    }
    if git::has_unstaged_changes(path)? {
        return Ok(changed("has unstaged changes"));
    }
    Ok(RepoStatus::Unchanged)
}

/// Compare the repository at `path` with `entry`. Any git failure while
/// inspecting the repository is reported as a change.
pub fn repository_status(path: &Path, entry: &ManifestEntry) -> RepoStatus {
    status_of(path, entry).unwrap_or_else(|e| {
        debug!("Status of {} failed: {}", path.display(), e);
        changed("failed to get status")
    })
}

/// Status of every repository of the view that exists on disk, in manifest
/// order.
pub fn view_status(viewdir: &Path) -> Result<Vec<(String, RepoStatus)>> {
    let view = read_view(viewdir)?;
    Ok(view
        .entries
        .iter()
        .filter(|entry| viewdir.join(&entry.directory).exists())
        .map(|entry| {
            let status = repository_status(&viewdir.join(&entry.directory), entry);
            (entry.directory.clone(), status)
        })
        .collect())
}

fn update_error(entry: &ManifestEntry, reason: impl Into<String>) -> Error {
    Error::Update {
        directory: entry.directory.clone(),
        reason: reason.into(),
    }
}

/// Bring one repository in line with `entry`.
///
/// A missing repository is cloned and checked out. An existing one is only
/// touched if it has no local changes relative to `previous` (the entry it
/// was last updated to), or, with `force`, if it still points at the entry's
/// URL.
pub fn update_repo(
    viewdir: &Path,
    entry: &ManifestEntry,
    previous: &ManifestEntry,
    force: bool,
) -> Result<()> {
    if entry.vcs != VCS_GIT {
        return Err(update_error(
            entry,
            format!("unsupported version control system '{}'", entry.vcs),
        ));
    }
    let repo = viewdir.join(&entry.directory);

    if repo.exists() {
        if force {
            if git::remote_url(&repo, "origin")? != entry.url {
                return Err(update_error(entry, "has changed origin"));
            }
        } else if let RepoStatus::Changed(reason) = repository_status(&repo, previous) {
            return Err(update_error(entry, reason));
        }

        info!("Pulling {}...", entry.directory);
        git::set_remote_url(&repo, "origin", &entry.url)?;
        if entry.has_pinned_revision() {
            if !git::commit_exists(&repo, &entry.revision) {
                git::fetch(&repo)?;
            }
            git::checkout(&repo, &entry.revision, force)?;
        } else {
            git::fetch(&repo)?;
            git::checkout(&repo, &entry.branch, force)?;
            git::reset_hard(&repo, &format!("origin/{}", entry.branch))?;
        }
    } else {
        info!("Cloning {}...", entry.directory);
        git::clone(&entry.url, &repo, None, true)?;
        if entry.has_pinned_revision() {
            git::checkout(&repo, &entry.revision, true)?;
        } else {
            git::reset_to_remote(&repo, &entry.branch)?;
        }
    }
    git::submodule_update(&repo)
}

/// Entries in the order they should be checked out: parents before the
/// repositories nested in them, manifest order otherwise.
pub fn checkout_order(manifest: &Manifest) -> Vec<&ManifestEntry> {
    let mut entries: Vec<&ManifestEntry> = manifest.entries.iter().collect();
    entries.sort_by_key(|entry| Path::new(&entry.directory).components().count());
    entries
}

/// Outcome of updating every repository of a view.
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub updated: Vec<String>,
    pub failures: Vec<(String, Error)>,
}

impl UpdateReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// One `<directory>: <reason>` line per failed repository.
    pub fn failure_lines(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|(directory, error)| match error {
                Error::Update { .. } => error.to_string(),
                other => format!("{}: {}", directory, other),
            })
            .collect()
    }
}

/// Update every repository of the view at `viewdir`.
///
/// `previous` is the manifest the repositories were last updated to; entries
/// it lacks are compared against the current manifest.
pub fn update_repos(viewdir: &Path, previous: Option<&Manifest>, force: bool) -> Result<UpdateReport> {
    let view = read_view(viewdir)?;
    let mut old_entries: HashMap<&str, &ManifestEntry> = view
        .entries
        .iter()
        .map(|entry| (entry.directory.as_str(), entry))
        .collect();
    if let Some(previous) = previous {
        old_entries.extend(
            previous
                .entries
                .iter()
                .map(|entry| (entry.directory.as_str(), entry)),
        );
    }

    let mut report = UpdateReport::default();
    for entry in checkout_order(&view) {
        let old = old_entries
            .get(entry.directory.as_str())
            .copied()
            .unwrap_or(entry);
        match update_repo(viewdir, entry, old, force) {
            Ok(()) => report.updated.push(entry.directory.clone()),
            Err(e) => {
                warn!("{} was not updated: {}", entry.directory, e);
                report.failures.push((entry.directory.clone(), e));
            }
        }
    }
    Ok(report)
}

/// Result of moving the view itself to another revision.
#[derive(Debug, Default)]
pub struct ViewTransition {
    pub report: UpdateReport,
    /// Directories that left the view and may be deleted.
    pub removed: Vec<String>,
}

fn transition<F>(viewdir: &Path, force: bool, move_view: F) -> Result<ViewTransition>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let old = read_view(viewdir)?;
    move_view(viewdir)?;
    let new = read_view(viewdir)?;
    let report = update_repos(viewdir, Some(&old), force)?;
    Ok(ViewTransition {
        report,
        removed: diff::removed_directories(&old, &new),
    })
}

/// Check out `revision` of the view and update its repositories.
pub fn checkout_view(viewdir: &Path, revision: &str, force: bool) -> Result<ViewTransition> {
    transition(viewdir, force, |dir| git::checkout(dir, revision, false))
}

/// Fast-forward the view from its upstream and update its repositories.
pub fn pull_view(viewdir: &Path) -> Result<ViewTransition> {
    transition(viewdir, false, |dir| {
        info!("Pulling {}...", dir.display());
        git::pull_ff_only(dir)
    })
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    Ok(path.is_dir() && fs::read_dir(path)?.next().is_none())
}

/// Clone the view at `url` into `directory` (or a name derived from the URL)
/// and check out all of its repositories.
pub fn clone_view(
    url: &str,
    directory: Option<&Path>,
    branch: Option<&str>,
) -> Result<(PathBuf, UpdateReport)> {
    let viewdir = match directory {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from(git::humanish_name(url)?),
    };
    if viewdir.exists() && !is_empty_dir(&viewdir)? {
        return Err(Error::Update {
            directory: viewdir.display().to_string(),
            reason: "destination exists and is not an empty directory".to_string(),
        });
    }

    info!("Cloning {}...", viewdir.display());
    git::clone(url, &viewdir, branch, false)?;
    let report = update_repos(&viewdir, None, false)?;
    Ok((viewdir, report))
}

/// Paths of the other entries nested below `entry`, relative to it.
pub fn clean_excludes(entry: &ManifestEntry, entries: &[ManifestEntry]) -> Vec<String> {
    let prefix = format!("{}/", entry.directory);
    entries
        .iter()
        .filter_map(|other| other.directory.strip_prefix(&prefix))
        .map(str::to_string)
        .collect()
}

/// Remove untracked and ignored files from the view and every repository in
/// it. Returns the directories that were skipped because they do not exist.
pub fn clean_repos(viewdir: &Path) -> Result<Vec<String>> {
    let view = read_view(viewdir)?;
    let top_level: Vec<String> = view
        .entries
        .iter()
        .map(|entry| entry.directory.clone())
        .collect();
    git::clean(viewdir, &top_level)?;

    let mut skipped = Vec::new();
    for entry in &view.entries {
        let repo = viewdir.join(&entry.directory);
        if !repo.exists() {
            skipped.push(entry.directory.clone());
            continue;
        }
        git::clean(&repo, &clean_excludes(entry, &view.entries))?;
    }
    Ok(skipped)
}

/// Run `command` in every repository of the view that exists on disk.
///
/// Non-zero exit statuses are returned, not treated as errors; failing to
/// spawn the command is.
pub fn foreach_repo(viewdir: &Path, command: &[String]) -> Result<Vec<(String, ExitStatus)>> {
    let (program, args) = command.split_first().ok_or_else(|| Error::Config {
        message: "no command given".to_string(),
    })?;
    let view = read_view(viewdir)?;
    let mut results = Vec::new();
    for entry in &view.entries {
        let repo = viewdir.join(&entry.directory);
        if !repo.exists() {
            continue;
        }
        let status = Command::new(program).args(args).current_dir(&repo).status()?;
        results.push((entry.directory.clone(), status));
    }
    Ok(results)
}

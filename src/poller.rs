//! # Versioning Loop
//!
//! A [`Poller`] watches one branch of a view repository and records pinned
//! snapshots of its manifest on an output branch (`versioned/<branch>` by
//! default). Every iteration walks the same sequence of states:
//!
//! ```text
//! Fetching -> ReadingManifest -> Locking -> CheckingOutOutputBranch -> Writing
//!          -> Deciding -> (CommittingAndNotifying | Idle) -> Sleeping
//! ```
//!
//! - **Fetching** refreshes the local clone and resolves the tracked branch.
//! - **ReadingManifest** parses the manifest at that commit.
//! - **Locking** replaces every `HEAD` revision by the current remote tip of
//!   its branch and appends a `.unversioned_view` entry pinned to the view
//!   commit that was read.
//! - **CheckingOutOutputBranch** resets to the remote output branch, or starts
//!   an orphan branch when there is none yet.
//! - **Writing** stores and stages the locked manifest.
//! - **Deciding** commits when the output branch is new or the staged manifest
//!   differs from the last snapshot.
//! - **CommittingAndNotifying** commits, pushes, then hands a [`ViewChange`] to
//!   the listener.
//!
//! Each iteration is fully synchronous. Any error aborts the iteration and is
//! returned to the caller; nothing is pushed unless the commit succeeded.
//! [`Poller::run_until`] only consults its stop predicate around the sleep, so
//! an iteration is never interrupted halfway.

use std::fmt;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::config::PollerConfig;
use crate::defaults;
use crate::error::{Error, Result};
use crate::manifest::{self, Manifest, ManifestEntry, DEFAULT_FILENAME, VCS_GIT};
use crate::repository::GitOperations;

/// States of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Fetching,
    ReadingManifest,
    Locking,
    CheckingOutOutputBranch,
    Writing,
    Deciding,
    CommittingAndNotifying,
    Idle,
    Sleeping,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PollState::Fetching => "fetching",
            PollState::ReadingManifest => "reading manifest",
            PollState::Locking => "locking revisions",
            PollState::CheckingOutOutputBranch => "checking out output branch",
            PollState::Writing => "writing",
            PollState::Deciding => "deciding",
            PollState::CommittingAndNotifying => "committing",
            PollState::Idle => "idle",
            PollState::Sleeping => "sleeping",
        };
        f.write_str(name)
    }
}

/// A new snapshot on the output branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewChange {
    /// URL of the view repository.
    pub url: String,
    /// Output branch the snapshot was committed to.
    pub branch: String,
    /// Tip of the output branch before the commit, `None` for the first
    /// snapshot ever recorded.
    pub previous: Option<String>,
    pub current: String,
}

/// Result of a single iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Unchanged,
    Committed(ViewChange),
}

/// Receives every snapshot committed by the loop.
pub trait ChangeListener {
    fn on_change(&mut self, change: &ViewChange) -> Result<()>;
}

impl<F> ChangeListener for F
where
    F: FnMut(&ViewChange) -> Result<()>,
{
    fn on_change(&mut self, change: &ViewChange) -> Result<()> {
        self(change)
    }
}

/// The suspension point between two iterations.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps on the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Pin every entry that tracks a branch tip to the tip currently advertised by
/// its remote. Entries with a pinned revision are left alone.
pub fn lock_revisions(manifest: &mut Manifest, git: &dyn GitOperations) -> Result<()> {
    for entry in manifest
        .entries
        .iter_mut()
        .filter(|entry| !entry.has_pinned_revision())
    {
        let heads = git.list_remote_heads(&entry.url, &entry.branch)?;
        let tip = heads.get(&entry.branch).ok_or_else(|| Error::RefNotFound {
            url: entry.url.clone(),
            reference: entry.branch.clone(),
        })?;
        debug!("Locked {} to {}", entry.directory, tip);
        entry.revision = tip.clone();
    }
    Ok(())
}

/// The versioning loop for one view repository branch.
pub struct Poller {
    config: PollerConfig,
    git: Arc<dyn GitOperations>,
    listener: Option<Box<dyn ChangeListener>>,
    sleeper: Box<dyn Sleeper>,
    state: PollState,
    prepared: bool,
}

impl Poller {
    pub fn new(config: PollerConfig, git: Arc<dyn GitOperations>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            git,
            listener: None,
            sleeper: Box::new(ThreadSleeper),
            state: PollState::Sleeping,
            prepared: false,
        })
    }

    pub fn with_listener(mut self, listener: impl ChangeListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// State of the last step entered.
    pub fn state(&self) -> PollState {
        self.state
    }

    fn enter(&mut self, state: PollState) {
        debug!("{} -> {}", self.state, state);
        self.state = state;
    }

    /// Clone the view repository on first use and configure the identity
    /// used for snapshot commits.
    fn prepare(&mut self) -> Result<()> {
        if self.prepared {
            return Ok(());
        }
        let view_dir = self.config.view_dir();
        if !view_dir.exists() {
            info!("Cloning view into '{}'...", view_dir.display());
            self.git.clone_working(&self.config.url, &view_dir)?;
        }
        self.git.set_identity(
            &view_dir,
            defaults::COMMITTER_NAME,
            defaults::COMMITTER_EMAIL,
        )?;
        self.prepared = true;
        Ok(())
    }

    /// Run one iteration, without the trailing sleep.
    pub fn poll_once(&mut self) -> Result<PollOutcome> {
        self.prepare()?;
        let git = Arc::clone(&self.git);
        let view_dir = self.config.view_dir();
        let output_branch = self.config.output_branch();

        self.enter(PollState::Fetching);
        git.fetch(&view_dir)?;
        let view_id = git.resolve_ref(&view_dir, &format!("origin/{}", self.config.branch))?;

        self.enter(PollState::ReadingManifest);
        let bytes = git.read_file_at_commit(&view_dir, &view_id, DEFAULT_FILENAME)?;
        let source_name = format!("{}@{}", DEFAULT_FILENAME, view_id);
        let mut locked = manifest::parse_bytes(&bytes, &source_name)?;

        self.enter(PollState::Locking);
        lock_revisions(&mut locked, &*git)?;
        locked.push(ManifestEntry::new(
            defaults::UNVERSIONED_VIEW_DIRECTORY,
            self.config.url.as_str(),
            VCS_GIT,
            self.config.branch.as_str(),
            view_id.as_str(),
        ));

        self.enter(PollState::CheckingOutOutputBranch);
        let previous = if git.remote_branch_exists(&view_dir, &output_branch) {
            git.reset_branch_to_remote(&view_dir, &output_branch)?;
            Some(git.resolve_ref(&view_dir, "HEAD")?)
        } else {
            git.checkout_orphan_branch(&view_dir, &output_branch)?;
            None
        };

        self.enter(PollState::Writing);
        fs::write(view_dir.join(DEFAULT_FILENAME), locked.serialize())?;
        git.stage_file(&view_dir, DEFAULT_FILENAME)?;

        self.enter(PollState::Deciding);
        let changed = previous.is_none() || git.has_staged_changes(&view_dir)?;
        if !changed {
            self.enter(PollState::Idle);
            debug!("No changes");
            return Ok(PollOutcome::Unchanged);
        }

        self.enter(PollState::CommittingAndNotifying);
        info!("Change detected");
        git.commit(&view_dir, defaults::COMMIT_MESSAGE)?;
        git.push_branch(&view_dir, &output_branch)?;
        let current = git.resolve_ref(&view_dir, "HEAD")?;

        let change = ViewChange {
            url: self.config.url.clone(),
            branch: output_branch,
            previous,
            current,
        };
        if let Some(listener) = self.listener.as_mut() {
            listener.on_change(&change)?;
        }
        Ok(PollOutcome::Committed(change))
    }

    /// Poll repeatedly until `stop` returns true. `stop` is checked after each
    /// iteration and again after each sleep.
    pub fn run_until<F>(&mut self, mut stop: F) -> Result<()>
    where
        F: FnMut() -> bool,
    {
        loop {
            self.poll_once()?;
            if stop() {
                return Ok(());
            }
            self.enter(PollState::Sleeping);
            self.sleeper.sleep(self.config.poll_interval());
            if stop() {
                return Ok(());
            }
        }
    }

    /// Poll forever. Returns only on error.
    pub fn run(&mut self) -> Result<()> {
        self.run_until(|| false)
    }
}

//! # Poll Command Implementation
//!
//! Runs the versioning loop for one branch of a view repository. Each time the
//! pinned manifest changes a snapshot is committed to the output branch, the
//! commits since the previous snapshot are resolved, and they are reported
//! through a notifier (log lines by default, JSON lines with `--json`).
//!
//! Settings come from `--config` when given; command line flags override
//! individual values.

use anyhow::{Context, Result};
use clap::Args;
use log::info;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use repo_view::cache::RepoCache;
use repo_view::config::{self, PollerConfig};
use repo_view::notify::{JsonLinesNotifier, LogNotifier, Notifier};
use repo_view::poller::{PollOutcome, Poller, ViewChange};
use repo_view::repository::{DefaultGitOperations, GitOperations};
use repo_view::resolve::CommitResolver;

/// Record pinned snapshots of a view branch
#[derive(Args, Debug)]
pub struct PollArgs {
    /// Working directory of the poller
    #[arg(required_unless_present = "config")]
    pub directory: Option<PathBuf>,

    /// URL of the view repository
    #[arg(required_unless_present = "config")]
    pub url: Option<String>,

    /// Branch of the view repository to track [default: master]
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Seconds between two polls [default: 60]
    #[arg(long, value_name = "N")]
    pub poll_interval: Option<u64>,

    /// Prefix of the output branch [default: versioned/]
    #[arg(long, value_name = "PREFIX")]
    pub output_prefix: Option<String>,

    /// YAML file with poller settings
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The root directory for the repository cache.
    ///
    /// Defaults to `<directory>/cache`.
    #[arg(long, value_name = "DIR")]
    pub cache_root: Option<PathBuf>,

    /// Poll once and exit
    #[arg(long)]
    pub once: bool,

    /// Report commits as JSON lines on stdout
    #[arg(long)]
    pub json: bool,
}

/// Merge the configuration file (if any) with command line overrides.
fn load_config(args: &PollArgs) -> Result<PollerConfig> {
    let mut config = match (&args.config, &args.directory, &args.url) {
        (Some(path), _, _) => config::from_file(path)
            .with_context(|| format!("Failed to load poller configuration from {}", path.display()))?,
        (None, Some(directory), Some(url)) => PollerConfig::new(directory, url.as_str()),
        _ => anyhow::bail!("a directory and a url are required without --config"),
    };

    if let Some(directory) = &args.directory {
        config.directory = directory.clone();
    }
    if let Some(url) = &args.url {
        config.url = url.clone();
    }
    if let Some(branch) = &args.branch {
        config.branch = branch.clone();
    }
    if let Some(interval) = args.poll_interval {
        config.poll_interval_secs = interval;
    }
    if let Some(prefix) = &args.output_prefix {
        config.output_prefix = prefix.clone();
    }
    if let Some(cache_root) = &args.cache_root {
        config.cache_root = Some(cache_root.clone());
    }
    config.validate()?;
    Ok(config)
}

/// Resolve the commits behind a new snapshot and hand them to `notifier`.
fn report_change(
    cache: &RepoCache,
    notifier: &mut dyn Notifier,
    change: &ViewChange,
) -> repo_view::error::Result<()> {
    let Some(previous) = &change.previous else {
        info!("Recorded initial snapshot {} on {}", change.current, change.branch);
        return Ok(());
    };
    let commits =
        CommitResolver::new(cache).commits(&change.url, &change.branch, previous, &change.current)?;
    info!("{} commits since {}", commits.len(), previous);
    notifier.notify(&commits)
}

/// Execute the `poll` command.
pub fn execute(args: PollArgs) -> Result<()> {
    let config = load_config(&args)?;
    let git: Arc<dyn GitOperations> = Arc::new(DefaultGitOperations);
    let cache = RepoCache::new(config.cache_dir(), Arc::clone(&git));
    let mut notifier: Box<dyn Notifier> = if args.json {
        Box::new(JsonLinesNotifier::new(io::stdout()))
    } else {
        Box::new(LogNotifier)
    };

    info!(
        "Polling {} ({}) every {}s into {}",
        config.url,
        config.branch,
        config.poll_interval_secs,
        config.output_branch()
    );
    let mut poller = Poller::new(config, git)?.with_listener(
        move |change: &ViewChange| -> repo_view::error::Result<()> {
            report_change(&cache, &mut *notifier, change)
        },
    );

    if args.once {
        match poller.poll_once()? {
            PollOutcome::Committed(change) => println!("{}", change.current),
            PollOutcome::Unchanged => info!("No changes"),
        }
        return Ok(());
    }
    poller.run()?;
    Ok(())
}

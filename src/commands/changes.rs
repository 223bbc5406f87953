//! # Changes Command Implementation
//!
//! Prints the commits that lead from one revision of a view to another:
//! first the commits of every repository whose pinned revision moved, in
//! directory order, then the commits of the view repository itself.
//!
//! ## Example
//!
//! ```bash
//! repo-view changes https://example.com/view.git versioned/master 1a2b3c 4d5e6f
//! repo-view changes --json https://example.com/view.git versioned/master 1a2b3c 4d5e6f
//! ```

use anyhow::{Context, Result};
use clap::Args;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use repo_view::cache::RepoCache;
use repo_view::defaults;
use repo_view::notify::{JsonLinesNotifier, Notifier};
use repo_view::repository::DefaultGitOperations;
use repo_view::resolve::{Commit, CommitResolver};

/// List the commits between two revisions of a view
#[derive(Args, Debug)]
pub struct ChangesArgs {
    /// URL of the view repository
    pub url: String,

    /// Branch of the view repository the revisions belong to
    pub branch: String,

    /// Revision to start from (excluded)
    pub old: String,

    /// Revision to end at (included)
    pub new: String,

    /// The root directory for the repository cache.
    ///
    /// If not provided, it defaults to the system's cache directory
    /// (e.g., `~/.cache/repo-view` on Linux).
    /// Can also be set with the `REPO_VIEW_CACHE` environment variable.
    #[arg(long, value_name = "DIR", env = "REPO_VIEW_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Output one JSON object per commit
    #[arg(long)]
    pub json: bool,
}

/// Execute the `changes` command.
pub fn execute(args: ChangesArgs) -> Result<()> {
    let cache_root = args.cache_root.unwrap_or_else(defaults::default_cache_root);
    let cache = RepoCache::new(cache_root, Arc::new(DefaultGitOperations));
    let commits = CommitResolver::new(&cache)
        .commits(&args.url, &args.branch, &args.old, &args.new)
        .with_context(|| {
            format!(
                "Failed to resolve changes of {} between {} and {}",
                args.url, args.old, args.new
            )
        })?;

    if args.json {
        JsonLinesNotifier::new(io::stdout()).notify(&commits)?;
    } else if commits.is_empty() {
        println!("No changes.");
    } else {
        for commit in &commits {
            print_commit(commit);
        }
    }
    Ok(())
}

fn print_commit(commit: &Commit) {
    println!("commit {}", commit.revision);
    println!("Repository: {} ({})", commit.repository, commit.branch);
    println!("Author: {}", commit.author);
    println!("Date: {}", commit.timestamp);
    println!();
    for line in commit.message.lines() {
        println!("    {}", line);
    }
    println!();
    for filename in &commit.filenames {
        println!("  {}", filename);
    }
    println!();
}

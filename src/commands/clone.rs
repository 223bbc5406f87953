//! # Clone Command Implementation
//!
//! Clones a view repository and then every repository listed in its manifest.
//! Without a directory argument the view is cloned into the directory `git
//! clone` would pick for the same URL.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use repo_view::workspace;

/// Clone a view into a new directory
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// The repository to clone from
    pub repository: String,

    /// The name of the new directory to clone into
    pub directory: Option<PathBuf>,

    /// The name of the branch to clone
    #[arg(short, long)]
    pub branch: Option<String>,
}

/// Execute the `clone` command.
pub fn execute(args: CloneArgs) -> Result<()> {
    let (viewdir, report) = workspace::clone_view(
        &args.repository,
        args.directory.as_deref(),
        args.branch.as_deref(),
    )
    .with_context(|| format!("Failed to clone view {}", args.repository))?;

    println!(
        "Cloned {} repositories into {}",
        report.updated.len(),
        viewdir.display()
    );
    super::finish_update(&report)
}

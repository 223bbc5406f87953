//! # Clean Command Implementation

use anyhow::Result;
use clap::Args;

use repo_view::workspace;

/// Remove untracked files from the view and its repositories
#[derive(Args, Debug)]
pub struct CleanArgs {}

/// Execute the `clean` command.
///
/// Runs `git clean -dffx` in the view and in each repository, keeping nested
/// repositories intact.
pub fn execute(_args: CleanArgs) -> Result<()> {
    let viewdir = super::enclosing_view()?;
    for directory in workspace::clean_repos(&viewdir)? {
        println!("Skipping cleaning {} (not found)", directory);
    }
    Ok(())
}

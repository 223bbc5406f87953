//! # Update Command Implementation
//!
//! Brings every repository of the enclosing view in line with `view.txt`.
//! Repositories with local changes are left alone and reported at the end;
//! the others are still updated.

use anyhow::Result;
use clap::Args;

use repo_view::workspace;

/// Update repositories in a view
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Discard local modifications in repositories that still point at the
    /// expected origin
    #[arg(short, long)]
    pub force: bool,
}

/// Execute the `update` command.
pub fn execute(args: UpdateArgs) -> Result<()> {
    let viewdir = super::enclosing_view()?;
    let report = workspace::update_repos(&viewdir, None, args.force)?;
    super::finish_update(&report)
}

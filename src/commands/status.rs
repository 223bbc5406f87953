//! # Status Command Implementation
//!
//! Lists the repositories of the enclosing view whose origin, revision,
//! branch, index or working tree no longer match their manifest entry.

use anyhow::Result;
use clap::Args;

use repo_view::workspace;

/// Show repositories that have local changes
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also list repositories without changes
    #[arg(short, long)]
    pub all: bool,
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs) -> Result<()> {
    let viewdir = super::enclosing_view()?;
    let statuses = workspace::view_status(&viewdir)?;

    let mut had_change = false;
    for (directory, status) in &statuses {
        if status.is_changed() || args.all {
            println!("{}: {}", directory, status.report());
        }
        had_change |= status.is_changed();
    }
    if !had_change {
        println!("View has no local changes");
    }
    Ok(())
}

//! # Foreach Command Implementation
//!
//! Runs an arbitrary command inside every repository of the enclosing view.
//! A failing command is reported and the remaining repositories are still
//! visited.

use anyhow::{Context, Result};
use clap::Args;

use repo_view::workspace;

/// Run a command in each repository in the view
#[derive(Args, Debug)]
pub struct ForeachArgs {
    /// The command to run
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub cmd: Vec<String>,
}

/// Execute the `foreach` command.
pub fn execute(args: ForeachArgs) -> Result<()> {
    let viewdir = super::enclosing_view()?;
    let results = workspace::foreach_repo(&viewdir, &args.cmd)
        .with_context(|| format!("Failed to run '{}'", args.cmd.join(" ")))?;

    for (directory, status) in results {
        if !status.success() {
            match status.code() {
                Some(code) => println!("{}: command failed with exit status {}", directory, code),
                None => println!("{}: command terminated by signal", directory),
            }
        }
    }
    Ok(())
}

//! # Pull Command Implementation

use anyhow::Result;
use clap::Args;

use repo_view::workspace;

/// Pull changes to a view
#[derive(Args, Debug)]
pub struct PullArgs {}

/// Execute the `pull` command.
///
/// Fast-forwards the view repository and updates the repositories it lists.
pub fn execute(_args: PullArgs) -> Result<()> {
    let viewdir = super::enclosing_view()?;
    let transition = workspace::pull_view(&viewdir)?;
    super::report_removed(&transition.removed);
    super::finish_update(&transition.report)
}

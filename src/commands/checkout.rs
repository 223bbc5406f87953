//! # Checkout Command Implementation
//!
//! Checks out another revision of the view repository itself, then moves every
//! repository to the entry it has at that revision. Local changes are judged
//! against the entries of the revision being left.

use anyhow::{Context, Result};
use clap::Args;

use repo_view::workspace;

/// Check out a revision of the view
#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// Force the checkout (remove local modifications)
    #[arg(short, long)]
    pub force: bool,

    /// The revision to check out
    pub revision: String,
}

/// Execute the `checkout` command.
pub fn execute(args: CheckoutArgs) -> Result<()> {
    let viewdir = super::enclosing_view()?;
    let transition = workspace::checkout_view(&viewdir, &args.revision, args.force)
        .with_context(|| format!("Failed to check out {}", args.revision))?;
    super::report_removed(&transition.removed);
    super::finish_update(&transition.report)
}

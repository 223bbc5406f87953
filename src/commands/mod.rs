//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `repo-view`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic.
//!
//! The `execute` function is the main entry point for the command and is
//! responsible for orchestrating the necessary operations, calling into the
//! `repo_view` library to perform the core logic.

pub mod cache;
pub mod changes;
pub mod checkout;
pub mod clean;
pub mod clone;
pub mod completions;
pub mod foreach;
pub mod poll;
pub mod pull;
pub mod status;
pub mod update;

use std::path::PathBuf;

use anyhow::{Context, Result};

use repo_view::workspace::{self, UpdateReport};

/// The view enclosing the current directory.
pub(crate) fn enclosing_view() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
    Ok(workspace::find_enclosing_view_checked(&cwd)?)
}

/// Print the repositories that failed to update, failing if there are any.
pub(crate) fn finish_update(report: &UpdateReport) -> Result<()> {
    if report.is_success() {
        return Ok(());
    }
    println!("\nThe following repositories were not updated:");
    for line in report.failure_lines() {
        println!("{}", line);
    }
    anyhow::bail!("{} repositories were not updated", report.failures.len())
}

pub(crate) fn report_removed(removed: &[String]) {
    if removed.is_empty() {
        return;
    }
    println!("\nThe following repositories are no longer in the view and can be deleted:");
    for directory in removed {
        println!("{}", directory);
    }
}

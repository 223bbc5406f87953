//! Sinks for resolved commits.
//!
//! A [`Notifier`] receives the commits produced by
//! [`crate::resolve::CommitResolver`] whenever the versioning loop records a
//! new snapshot. Delivery to an actual build system is left to the caller.

use std::io::Write;

use log::info;

use crate::error::{Error, Result};
use crate::resolve::Commit;

pub trait Notifier {
    fn notify(&mut self, commits: &[Commit]) -> Result<()>;
}

/// Logs one line per commit at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, commits: &[Commit]) -> Result<()> {
        for commit in commits {
            let summary = commit.message.lines().next().unwrap_or_default();
            match &commit.parent_repository {
                Some(view) => info!(
                    "{} {} {} ({} via {}): {}",
                    commit.repository, commit.branch, commit.revision, commit.author, view, summary
                ),
                None => info!(
                    "{} {} {} ({}): {}",
                    commit.repository, commit.branch, commit.revision, commit.author, summary
                ),
            }
        }
        Ok(())
    }
}

/// Writes every commit as one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesNotifier<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for JsonLinesNotifier<W> {
    fn notify(&mut self, commits: &[Commit]) -> Result<()> {
        for commit in commits {
            serde_json::to_writer(&mut self.out, commit)?;
            self.out.write_all(b"\n").map_err(|e| Error::Notify {
                message: e.to_string(),
            })?;
        }
        self.out.flush().map_err(|e| Error::Notify {
            message: e.to_string(),
        })
    }
}

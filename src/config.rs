//! # Poller Configuration
//!
//! Settings for a running versioning loop, either loaded from a YAML file or
//! assembled from command line flags. Any field missing from a file falls
//! back to the values in [`crate::defaults`], so the smallest useful file is:
//!
//! ```yaml
//! directory: /var/lib/repo-view
//! url: https://example.com/view.git
//! ```
//!
//! A fuller one:
//!
//! ```yaml
//! directory: /var/lib/repo-view
//! url: https://example.com/view.git
//! branch: release
//! poll_interval_secs: 300
//! output_prefix: pinned/
//! cache_root: /var/cache/repo-view
//! ```
//!
//! When `cache_root` is absent the mirrors live in `<directory>/cache`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Local subdirectory holding the working clone of the view repository.
pub const VIEW_SUBDIRECTORY: &str = "view";

/// Local subdirectory holding the repository cache when none is configured.
pub const CACHE_SUBDIRECTORY: &str = "cache";

fn default_branch() -> String {
    defaults::BRANCH.to_string()
}

fn default_poll_interval_secs() -> u64 {
    defaults::POLL_INTERVAL_SECS
}

fn default_output_prefix() -> String {
    defaults::OUTPUT_PREFIX.to_string()
}

/// Configuration of one versioning loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Working directory of the poller; holds the view clone and, by default,
    /// the cache.
    pub directory: PathBuf,
    /// URL of the view repository.
    pub url: String,
    /// Branch of the view repository to track.
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Prefix of the output branch name.
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
    #[serde(default)]
    pub cache_root: Option<PathBuf>,
}

impl PollerConfig {
    /// Configuration with default branch, interval and output prefix.
    pub fn new(directory: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            url: url.into(),
            branch: default_branch(),
            poll_interval_secs: default_poll_interval_secs(),
            output_prefix: default_output_prefix(),
            cache_root: None,
        }
    }

    /// Check the values that would make the loop misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::Config {
                message: "view repository url must not be empty".to_string(),
            });
        }
        if self.branch.trim().is_empty() {
            return Err(Error::Config {
                message: "branch must not be empty".to_string(),
            });
        }
        if self.url.chars().any(char::is_whitespace) {
            return Err(Error::Config {
                message: format!("view repository url '{}' must not contain whitespace", self.url),
            });
        }
        if self.branch.chars().any(char::is_whitespace) {
            return Err(Error::Config {
                message: format!("branch '{}' must not contain whitespace", self.branch),
            });
        }
        if self.output_branch() == self.branch {
            return Err(Error::Config {
                message: format!(
                    "output branch must differ from the tracked branch '{}'; set a non-empty output prefix",
                    self.branch
                ),
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::Config {
                message: "poll interval must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Name of the branch snapshots are committed to.
    pub fn output_branch(&self) -> String {
        defaults::output_branch(&self.output_prefix, &self.branch)
    }

    pub fn view_dir(&self) -> PathBuf {
        self.directory.join(VIEW_SUBDIRECTORY)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_root
            .clone()
            .unwrap_or_else(|| self.directory.join(CACHE_SUBDIRECTORY))
    }
}

/// Parse and validate a YAML configuration.
pub fn parse(yaml_content: &str) -> Result<PollerConfig> {
    let config: PollerConfig = serde_yaml::from_str(yaml_content)?;
    config.validate()?;
    Ok(config)
}

pub fn from_file<P: AsRef<Path>>(path: P) -> Result<PollerConfig> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

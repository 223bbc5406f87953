//! # Error Handling
//!
//! This module defines the centralized error type for `repo-view`. It uses
//! `thiserror` to derive an `Error` enum covering every failure the core can
//! surface, with enough context (URLs, directories, line numbers, git stderr)
//! to act on the message without a debugger.
//!
//! ## Key Components
//!
//! - **`Error`**: All failures of the library. Parse errors abort the current
//!   operation; update errors are collected per repository by batch
//!   operations; cache inconsistencies are fatal for the running query.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Existence probes (for example "does commit X exist") never produce an
//! error. A probe whose git command fails answers "no".

use thiserror::Error;

/// Main error type for repo-view operations
#[derive(Error, Debug)]
pub enum Error {
    /// A significant manifest line did not have exactly five fields.
    #[error("Parse error in {source_name} line {line}: {message}")]
    Parse {
        source_name: String,
        /// 1-based line number of the offending line
        line: usize,
        message: String,
    },

    /// A repository in a view could not be brought in line with its entry.
    #[error("{directory}: {reason}")]
    Update { directory: String, reason: String },

    /// A freshly cloned mirror still lacks commits that were asked for.
    #[error("Cache inconsistency for {url}: missing {}", missing.join(", "))]
    CacheInconsistency { url: String, missing: Vec<String> },

    /// A git command exited unsuccessfully or could not be spawned.
    #[error("Git command failed for {target}: {command} - {stderr}")]
    GitCommand {
        command: String,
        target: String,
        stderr: String,
    },

    /// A remote did not advertise the branch a manifest entry tracks.
    #[error("Reference {reference} not found at {url}")]
    RefNotFound { url: String, reference: String },

    /// No enclosing view was found above a directory.
    #[error("not a view (or a subdirectory of a view): {path}")]
    NotInView { path: String },

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A notifier failed to deliver commits.
    #[error("Notification error: {message}")]
    Notify { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

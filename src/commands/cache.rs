//! # Cache Command Implementation
//!
//! This module implements the `cache` subcommand, which provides functionality
//! for managing the local repository cache.
//!
//! ## Subcommands
//!
//! - **`list`**: Display all cached mirrors with the URL they mirror
//! - **`clean`**: Remove the mirrors of the given URLs, or all of them with `--all`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use repo_view::cache::{CachedMirror, RepoCache};
use repo_view::defaults;
use repo_view::repository::DefaultGitOperations;

/// Manage repository cache
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// The root directory for the repository cache.
    ///
    /// If not provided, it defaults to the system's cache directory
    /// (e.g., `~/.cache/repo-view` on Linux).
    /// Can also be set with the `REPO_VIEW_CACHE` environment variable.
    #[arg(long, value_name = "DIR", env = "REPO_VIEW_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// List all cached repositories
    List(ListArgs),
    /// Clean cached repositories
    Clean(CleanArgs),
}

/// Arguments for the cache list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the cache clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// URLs of the repositories whose mirrors should be removed
    #[arg(conflicts_with = "all")]
    pub urls: Vec<String>,

    /// Delete all cached repositories
    #[arg(long)]
    pub all: bool,

    /// Show what would be deleted without actually deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct MirrorJson<'a> {
    url: &'a str,
    path: String,
}

/// Execute the `cache` command.
pub fn execute(args: CacheArgs) -> Result<()> {
    let cache_root = args.cache_root.unwrap_or_else(defaults::default_cache_root);
    let cache = RepoCache::new(cache_root, Arc::new(DefaultGitOperations));
    match args.command {
        CacheSubcommand::List(list_args) => execute_list(&cache, list_args),
        CacheSubcommand::Clean(clean_args) => execute_clean(&cache, clean_args),
    }
}

/// Execute the `cache list` command.
fn execute_list(cache: &RepoCache, args: ListArgs) -> Result<()> {
    let mirrors = cache.entries().with_context(|| {
        format!("Failed to read cache directory {}", cache.root().display())
    })?;

    if args.json {
        let json: Vec<MirrorJson> = mirrors
            .iter()
            .map(|mirror| MirrorJson {
                url: &mirror.url,
                path: mirror.path.display().to_string(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    if mirrors.is_empty() {
        println!("No cached repositories found in: {}", cache.root().display());
        return Ok(());
    }
    for mirror in &mirrors {
        println!("{}", mirror.url);
    }
    println!("\nTotal: {} cached repositories", mirrors.len());
    Ok(())
}

/// Execute the `cache clean` command.
fn execute_clean(cache: &RepoCache, args: CleanArgs) -> Result<()> {
    if !args.all && args.urls.is_empty() {
        anyhow::bail!("Nothing to clean: pass repository URLs or --all");
    }

    let targets: Vec<CachedMirror> = if args.all {
        cache.entries()?
    } else {
        args.urls
            .iter()
            .map(|url| CachedMirror {
                url: url.clone(),
                path: cache.path_for(url),
            })
            .filter(|mirror| mirror.path.exists())
            .collect()
    };

    if targets.is_empty() {
        println!("No cache entries match the specified criteria.");
        return Ok(());
    }

    if args.dry_run {
        for mirror in &targets {
            println!("Would delete: {} ({})", mirror.url, mirror.path.display());
        }
        println!("\nDry run mode - no changes were made.");
        return Ok(());
    }

    let mut deleted = 0;
    for mirror in &targets {
        match cache.remove(&mirror.url) {
            Ok(true) => {
                deleted += 1;
                println!("Deleted: {}", mirror.url);
            }
            Ok(false) => {}
            Err(e) => eprintln!("Failed to delete {}: {}", mirror.url, e),
        }
    }
    println!("\nDeleted {} cache entries.", deleted);
    Ok(())
}

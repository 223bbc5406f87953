//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Repository View - Compose and follow a tree of git repositories
#[derive(Parser, Debug)]
#[command(name = "repo-view")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone a view into a new directory
    Clone(commands::clone::CloneArgs),

    /// Update repositories in a view
    Update(commands::update::UpdateArgs),

    /// Check out a revision of the view and update its repositories
    Checkout(commands::checkout::CheckoutArgs),

    /// Pull changes to a view
    Pull(commands::pull::PullArgs),

    /// Show repositories that have local changes
    Status(commands::status::StatusArgs),

    /// Remove untracked files from the view and its repositories
    Clean(commands::clean::CleanArgs),

    /// Run a command in each repository in the view
    Foreach(commands::foreach::ForeachArgs),

    /// List the commits between two revisions of a view
    Changes(commands::changes::ChangesArgs),

    /// Record pinned snapshots of a view branch
    Poll(commands::poll::PollArgs),

    /// Manage repository cache
    Cache(commands::cache::CacheArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Clone(args) => commands::clone::execute(args),
            Commands::Update(args) => commands::update::execute(args),
            Commands::Checkout(args) => commands::checkout::execute(args),
            Commands::Pull(args) => commands::pull::execute(args),
            Commands::Status(args) => commands::status::execute(args),
            Commands::Clean(args) => commands::clean::execute(args),
            Commands::Foreach(args) => commands::foreach::execute(args),
            Commands::Changes(args) => commands::changes::execute(args),
            Commands::Poll(args) => commands::poll::execute(args),
            Commands::Cache(args) => commands::cache::execute(args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running inside tests.
    let _ = env_logger::Builder::from_env(env)
        .format_target(false)
        .try_init();
}

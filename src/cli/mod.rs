//! Command-line interface for mcpsync.
//!
//! Each subcommand lives in its own module with its own argument struct and
//! execution logic:
//!
//! - `providers` - list known providers, optionally filtered by priority tier
//! - `conflicts` - dry-run conflict detection for a mutation batch
//! - `install` - apply a mutation batch transactionally
//! - `remove` - remove server entries from provider configs
//! - `lock` - inspect the persisted lock state
//!
//! Global flags control verbosity: `--verbose` maps to a `debug` tracing
//! filter, `--quiet` disables logging entirely, and `RUST_LOG` overrides
//! both when set.

mod common;
mod conflicts;
mod install;
mod lock;
mod providers;
mod remove;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mcpsync",
    about = "Sync MCP servers and instruction files across AI coding agents",
    version,
    author
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output.
    ///
    /// Equivalent to `RUST_LOG=debug`. Mutually exclusive with `--quiet`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List known providers and their capabilities.
    Providers(providers::ProvidersCommand),

    /// Detect conflicts for a mutation batch without writing anything.
    Conflicts(conflicts::ConflictsCommand),

    /// Apply a mutation batch across providers, rolling back on failure.
    Install(install::InstallCommand),

    /// Remove server entries from provider configs.
    Remove(remove::RemoveCommand),

    /// Inspect the persisted lock state.
    Lock(lock::LockCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        self.init_tracing();

        match self.command {
            Commands::Providers(cmd) => cmd.execute(),
            Commands::Conflicts(cmd) => cmd.execute(),
            Commands::Install(cmd) => cmd.execute().await,
            Commands::Remove(cmd) => cmd.execute().await,
            Commands::Lock(cmd) => cmd.execute(),
        }
    }

    /// Initializes the global tracing subscriber from the verbosity flags.
    ///
    /// An explicit `RUST_LOG` always wins. Repeated initialization (as
    /// happens when tests drive `execute` more than once) is ignored.
    fn init_tracing(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if self.verbose {
            EnvFilter::new("debug")
        } else if self.quiet {
            EnvFilter::new("off")
        } else {
            EnvFilter::new("warn")
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

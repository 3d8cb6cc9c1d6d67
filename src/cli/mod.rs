//! Command-line interface for plugin-deps.
//!
//! # Available Commands
//!
//! - `parse` - Show how requirement tokens are split into identifier and endpoint
//! - `check` - Build the dependency graph for a units file and report dependents,
//!   missing dependencies and cycles
//! - `resolve` - Resolve metadata for required identifiers, fetching or synthesizing
//! - `cache` - Show or clear the persisted metadata cache
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Debug logging
//! - `--quiet` / `-q` - Errors only, no progress bar
//! - `--config` / `-c` - Config file (also `PLUGIN_DEPS_CONFIG`)
//! - `--no-progress` - Disable the progress bar
//!
//! ```bash
//! plugin-deps parse "ext|https://example.com/ext.json" "|bad"
//! plugin-deps check --units units.toml
//! plugin-deps resolve --units units.toml --format json
//! plugin-deps cache show
//! ```

pub mod cache;
pub mod check;
pub mod parse;
pub mod resolve;


use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::constants::CONFIG_PATH_ENV;

/// Output format shared by the reporting commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Settings derived from the global flags, passed to every command.
///
/// Commands read these instead of the process environment, so tests can run
/// commands with an explicit configuration.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `None` means `RUST_LOG`, falling back to `info`.
    pub log_level: Option<String>,

    /// Whether progress bars are hidden.
    pub no_progress: bool,

    /// Config file path; `None` means the default location.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the configuration file this invocation points at.
    pub async fn load_config(&self) -> Result<Config> {
        Config::load_with_optional(self.config_path.clone()).await
    }
}

/// Install the global tracing subscriber, writing to stderr.
///
/// Only the first call in a process has an effect.
pub fn init_logging(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Plugin dependency resolver
///
/// Parses "requires" declarations between plugins, reports missing
/// dependencies and cycles, and resolves dependency metadata from remote or
/// local sources with a TTL cache.
#[derive(Parser)]
#[command(
    name = "plugin-deps",
    about = "Resolve plugin dependencies and their metadata",
    version,
    long_about = "plugin-deps builds the dependency graph declared by installed plugins, \
                  detects missing dependencies and cycles, and resolves descriptive metadata \
                  for each dependency, synthesizing placeholders when no source answers."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors and hide progress
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the config file
    #[arg(short, long, global = true, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split requirement tokens into identifier and endpoint
    Parse(parse::ParseCommand),

    /// Report dependents, missing dependencies and cycles for a units file
    Check(check::CheckCommand),

    /// Resolve dependency metadata
    Resolve(resolve::ResolveCommand),

    /// Manage the persisted metadata cache
    Cache(cache::CacheCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        init_logging(config.log_level.as_deref());
        self.execute_with_config(config).await
    }

    /// Translate global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress || self.quiet,
            config_path: self.config.clone(),
        }
    }

    /// Run the command with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Parse(cmd) => cmd.execute(),
            Commands::Check(cmd) => cmd.execute(),
            Commands::Resolve(cmd) => cmd.execute(&config).await,
            Commands::Cache(cmd) => cmd.execute(&config).await,
        }
    }
}

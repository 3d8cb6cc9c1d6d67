//! `plugin-deps cache`: inspect or clear the persisted metadata cache.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::sync::Arc;

use super::{CliConfig, OutputFormat};
use crate::cache::{MetadataCache, SystemClock};

/// Manage the persisted metadata cache.
#[derive(Args, Debug)]
pub struct CacheCommand {
    #[command(subcommand)]
    command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
enum CacheSubcommand {
    /// Delete the cache snapshot
    Clear,

    /// List live cache entries
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

impl CacheCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = cli.load_config().await?;
        let path = config.cache_path()?;

        match self.command {
            CacheSubcommand::Clear => {
                if path.exists() {
                    tokio::fs::remove_file(&path)
                        .await
                        .with_context(|| format!("Failed to remove cache file {}", path.display()))?;
                    println!("{} metadata cache at {}", "Cleared".green().bold(), path.display());
                } else {
                    println!("No metadata cache at {}", path.display());
                }
            }
            CacheSubcommand::Show {
                format,
            } => {
                let cache = MetadataCache::load_from(&path, Arc::new(SystemClock)).await?;
                let entries = cache.entries();

                match format {
                    OutputFormat::Json => {
                        let json =
                            serde_json::to_string_pretty(&entries).context("Failed to serialize cache entries")?;
                        println!("{json}");
                    }
                    OutputFormat::Text if entries.is_empty() => println!("Metadata cache is empty"),
                    OutputFormat::Text => {
                        println!("{} ({} entries)", path.display().to_string().bold(), entries.len());
                        for entry in &entries {
                            let origin = if entry.record.is_synthesized() {
                                "synthesized".yellow()
                            } else {
                                "fetched".green()
                            };
                            let expires = entry
                                .expires_at()
                                .map_or_else(|| "never".to_string(), |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
                            println!("  {}  {}  [{}]  expires {}", entry.identifier.cyan(), entry.record.name, origin, expires);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

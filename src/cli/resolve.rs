//! `plugin-deps resolve`: resolve dependency metadata for a units file.
//!
//! Uses the persisted cache when `[cache] persist` is on, fetches through
//! [`HttpFetcher`], and saves the cache again afterwards. Identifiers that no
//! source can supply come back as synthesized placeholders.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use super::{CliConfig, OutputFormat};
use crate::cache::{MetadataCache, SystemClock};
use crate::config::Config;
use crate::context::DependencyContext;
use crate::fetch::HttpFetcher;
use crate::host::UnitsManifest;
use crate::metadata::MetadataRecord;
use crate::resolver::ResolvedSet;
use crate::utils::progress::ProgressBar;

/// Resolve metadata for required identifiers.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Units file (TOML `[[units]]`, or JSON when it ends in `.json`)
    #[arg(short, long)]
    units: PathBuf,

    /// Identifiers to resolve; defaults to every required identifier
    identifiers: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Ignore cached entries for the requested identifiers
    #[arg(long)]
    refresh: bool,
}

impl ResolveCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = cli.load_config().await?;
        let cache = Arc::new(load_cache(&config).await?);
        let fetcher = HttpFetcher::new().context("Failed to create HTTP client")?;

        let mut context = DependencyContext::new(cache.clone(), Arc::new(fetcher))
            .with_endpoints(&config)
            .with_options(config.resolver_options());
        let graph = context
            .rebuild(&UnitsManifest::new(&self.units))
            .with_context(|| format!("Failed to load units from {}", self.units.display()))?;

        let identifiers: Vec<String> = if self.identifiers.is_empty() {
            graph.required_identifiers().iter().cloned().collect()
        } else {
            self.identifiers.clone()
        };

        if self.refresh {
            for identifier in &identifiers {
                cache.invalidate(identifier);
            }
        }

        let progress = ProgressBar::new(identifiers.len() as u64, cli.no_progress);
        progress.set_prefix("Resolving");
        let resolved = context.resolver().resolve_all(identifiers, Some(&progress)).await;
        progress.finish_and_clear();

        if config.cache.persist {
            let path = config.cache_path()?;
            cache.save_to(&path).await.with_context(|| format!("Failed to save cache to {}", path.display()))?;
        }

        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(resolved.records())
                    .context("Failed to serialize resolved metadata")?;
                println!("{json}");
            }
            OutputFormat::Text => print_text(&resolved),
        }
        Ok(())
    }
}

/// Load the persisted cache, or an empty one when persistence is off.
///
/// A corrupt snapshot is discarded with a warning rather than failing the run.
async fn load_cache(config: &Config) -> Result<MetadataCache> {
    if !config.cache.persist {
        return Ok(MetadataCache::new());
    }
    let path = config.cache_path()?;
    match MetadataCache::load_from(&path, Arc::new(SystemClock)).await {
        Ok(cache) => Ok(cache),
        Err(e) => {
            warn!("Ignoring unreadable metadata cache at {}: {:#}", path.display(), e);
            Ok(MetadataCache::new())
        }
    }
}

fn print_text(resolved: &ResolvedSet) {
    if resolved.is_empty() {
        println!("No dependencies to resolve");
        return;
    }

    let width = resolved.records().iter().map(|r| r.identifier.len()).max().unwrap_or(0);
    for record in resolved.records() {
        let identifier = format!("{:<width$}", record.identifier);
        println!("  {}  {}", identifier.cyan(), describe(record));
    }

    println!(
        "\n{} {} dependencies: {} fetched, {} synthesized",
        "Resolved".green().bold(),
        resolved.len(),
        resolved.fetched_count(),
        resolved.synthesized_count()
    );
}

fn describe(record: &MetadataRecord) -> String {
    if record.is_synthesized() {
        format!("{} {}", record.name, "(synthesized: manual installation required)".yellow())
    } else if record.version.is_empty() {
        record.name.clone()
    } else {
        format!("{} {}", record.name, record.version.dimmed())
    }
}

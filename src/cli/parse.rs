//! `plugin-deps parse`: show how requirement tokens are split.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::OutputFormat;
use crate::requirement::{Requirement, parse};

/// Split each token into identifier and endpoint.
///
/// Tokens that cannot be split unambiguously are shown whole as the
/// identifier, with no endpoint.
#[derive(Args, Debug)]
pub struct ParseCommand {
    /// Requirement tokens, e.g. `ext|https://example.com/ext.json`
    #[arg(required = true)]
    tokens: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct ParsedToken<'a> {
    token: &'a str,
    #[serde(flatten)]
    requirement: Requirement,
}

impl ParseCommand {
    pub fn execute(self) -> Result<()> {
        let parsed: Vec<ParsedToken<'_>> = self
            .tokens
            .iter()
            .map(|token| ParsedToken {
                token,
                requirement: parse(token),
            })
            .collect();

        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&parsed).context("Failed to serialize parse results")?;
                println!("{json}");
            }
            OutputFormat::Text => {
                for entry in &parsed {
                    let endpoint = match &entry.requirement.endpoint {
                        Some(endpoint) => endpoint.green().to_string(),
                        None => "(none)".dimmed().to_string(),
                    };
                    println!("{:?}", entry.token);
                    println!("  identifier: {}", entry.requirement.identifier.bold());
                    println!("  endpoint:   {endpoint}");
                }
            }
        }
        Ok(())
    }
}

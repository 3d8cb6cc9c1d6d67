//! `plugin-deps check`: dependency report for a units file.
//!
//! Reports which units require each identifier, which required identifiers
//! are not installed, which identifiers carry an inline endpoint, and mutual
//! requirement cycles. The command succeeds even when problems are found;
//! the report is the signal.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use super::OutputFormat;
use crate::graph::{DependencyGraph, find_cycle_paths, find_cycles};
use crate::host::{UnitSource, UnitsManifest};
use crate::source::SourceRegistry;

/// Build the dependency graph for a units file and report on it.
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Units file (TOML `[[units]]`, or JSON when it ends in `.json`)
    #[arg(short, long)]
    units: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Also report cycles longer than two identifiers
    #[arg(long)]
    all_cycles: bool,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    units: usize,
    required: BTreeSet<String>,
    dependents: BTreeMap<String, BTreeSet<String>>,
    missing: BTreeSet<String>,
    inline_endpoints: BTreeMap<String, String>,
    cycles: Vec<Vec<String>>,
}

impl CheckReport {
    fn build(graph: &DependencyGraph, all_cycles: bool) -> Self {
        let registry = SourceRegistry::from_graph(graph);
        let dependents = graph
            .required_identifiers()
            .iter()
            .map(|identifier| (identifier.clone(), graph.dependents_of(identifier).clone()))
            .collect();
        let inline_endpoints = registry
            .inline_identifiers()
            .iter()
            .filter_map(|identifier| {
                registry.inline_endpoint(identifier).map(|endpoint| (identifier.clone(), endpoint.to_string()))
            })
            .collect();
        let cycles = if all_cycles { find_cycle_paths(graph) } else { find_cycles(graph) };

        Self {
            units: graph.unit_count(),
            required: graph.required_identifiers().clone(),
            dependents,
            missing: graph.installed_vs_required(),
            inline_endpoints,
            cycles: cycles.into_iter().map(|cycle| cycle.members().to_vec()).collect(),
        }
    }

    fn print_text(&self) {
        println!(
            "{} {} units, {} required identifiers",
            "Checked".green().bold(),
            self.units,
            self.required.len()
        );

        if !self.dependents.is_empty() {
            println!("\n{}", "Dependents:".bold());
            for (identifier, units) in &self.dependents {
                let units: Vec<&str> = units.iter().map(String::as_str).collect();
                println!("  {} ← {}", identifier.cyan(), units.join(", "));
            }
        }

        if !self.inline_endpoints.is_empty() {
            println!("\n{}", "Inline endpoints:".bold());
            for (identifier, endpoint) in &self.inline_endpoints {
                println!("  {} → {}", identifier.cyan(), endpoint);
            }
        }

        if self.missing.is_empty() {
            println!("\n{}", "All dependencies are installed".green());
        } else {
            println!("\n{}", "Missing dependencies:".yellow().bold());
            for identifier in &self.missing {
                let required_by: Vec<&str> =
                    self.dependents.get(identifier).into_iter().flatten().map(String::as_str).collect();
                println!("  {} (required by {})", identifier.yellow(), required_by.join(", "));
            }
        }

        if self.cycles.is_empty() {
            println!("{}", "No dependency cycles".green());
        } else {
            println!("\n{}", "Dependency cycles:".red().bold());
            for cycle in &self.cycles {
                let first = cycle.first().map(String::as_str).unwrap_or_default();
                println!("  {} → {}", cycle.join(" → ").red(), first.red());
            }
        }
    }
}

impl CheckCommand {
    pub fn execute(self) -> Result<()> {
        let manifest = UnitsManifest::new(&self.units);
        let units = manifest.enumerate_units()?;
        let graph = DependencyGraph::build(units);
        let report = CheckReport::build(&graph, self.all_cycles);

        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&report).context("Failed to serialize check report")?;
                println!("{json}");
            }
            OutputFormat::Text => report.print_text(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::unit;

    #[test]
    fn test_report_contents() {
        let graph = DependencyGraph::build(vec![
            unit("a/a.php", "b, ext|https://example.com/ext.json"),
            unit("b/b.php", "a"),
        ]);
        let report = CheckReport::build(&graph, false);

        assert_eq!(report.units, 2);
        assert_eq!(report.missing.iter().collect::<Vec<_>>(), vec!["ext"]);
        assert_eq!(report.cycles, vec![vec!["a".to_string(), "b".to_string()]]);
        assert_eq!(
            report.inline_endpoints.get("ext").map(String::as_str),
            Some("https://example.com/ext.json")
        );
        assert!(report.dependents["b"].contains("a/a.php"));
    }

    #[test]
    fn test_all_cycles_includes_longer_walks() {
        let graph = DependencyGraph::build(vec![unit("a/a.php", "b"), unit("b/b.php", "c"), unit("c/c.php", "a")]);
        assert!(CheckReport::build(&graph, false).cycles.is_empty());
        assert_eq!(CheckReport::build(&graph, true).cycles.len(), 1);
    }
}

//! Dependency graph between installed units and the identifiers they require.
//!
//! The graph is built wholesale from one snapshot of installed units and never
//! patched afterwards; when the host's unit list changes, build a new one.
//! Both directions of every edge are recorded in the same pass, so
//! `dependencies_of` and `dependents_of` always agree.
//!
//! ```rust
//! use plugin_deps::core::Unit;
//! use plugin_deps::graph::DependencyGraph;
//!
//! let graph = DependencyGraph::build(vec![
//!     Unit::new("a/a.php", "A").with_requires("b"),
//!     Unit::new("b/b.php", "B"),
//! ]);
//!
//! assert!(graph.dependents_of("b").contains("a/a.php"));
//! assert!(graph.installed_vs_required().is_empty());
//! ```

pub mod cycles;

pub use cycles::{Cycle, find_cycle_paths, find_cycles};

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::core::Unit;
use crate::requirement::parse_declaration;
use crate::source::resolve_relative_endpoint;

static EMPTY: BTreeSet<String> = BTreeSet::new();

/// Dependent/dependency relations across all installed units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Units in host enumeration order.
    units: Vec<Unit>,
    /// Unit id → index into `units`.
    unit_index: BTreeMap<String, usize>,
    /// Unit slug → unit id, first unit wins.
    slug_index: BTreeMap<String, String>,
    /// Unit id → required identifiers.
    dependencies_of: BTreeMap<String, BTreeSet<String>>,
    /// Identifier → ids of the units requiring it.
    dependents_of: BTreeMap<String, BTreeSet<String>>,
    /// Every identifier required by at least one unit.
    all_identifiers: BTreeSet<String>,
    /// Inline endpoint overrides in discovery order; first one per identifier wins.
    inline_endpoints: Vec<(String, String)>,
}

impl DependencyGraph {
    /// Build the graph from one snapshot of installed units.
    ///
    /// Units with an empty id are skipped; a repeated id keeps the first entry.
    /// A unit requiring its own identifier gets no edge for it.
    pub fn build(units: impl IntoIterator<Item = Unit>) -> Self {
        let mut graph = Self::default();

        for unit in units {
            if unit.id.trim().is_empty() {
                warn!("Skipping unit with empty id (name: {:?})", unit.name);
                continue;
            }
            if graph.unit_index.contains_key(&unit.id) {
                warn!("Duplicate unit id '{}', keeping the first entry", unit.id);
                continue;
            }

            let slug = unit.slug();
            let mut required = BTreeSet::new();

            for requirement in parse_declaration(&unit.requires_plugins) {
                if requirement.identifier == slug {
                    debug!("Ignoring self-requirement of '{}'", unit.id);
                    continue;
                }

                if let Some(endpoint) = requirement.endpoint {
                    let endpoint = resolve_relative_endpoint(&endpoint, unit.base_url.as_deref());
                    graph.record_inline_endpoint(&requirement.identifier, endpoint);
                }

                graph
                    .dependents_of
                    .entry(requirement.identifier.clone())
                    .or_default()
                    .insert(unit.id.clone());
                graph.all_identifiers.insert(requirement.identifier.clone());
                required.insert(requirement.identifier);
            }

            graph.dependencies_of.insert(unit.id.clone(), required);
            graph.slug_index.entry(slug).or_insert_with(|| unit.id.clone());
            graph.unit_index.insert(unit.id.clone(), graph.units.len());
            graph.units.push(unit);
        }

        debug!(
            "Built dependency graph: {} units, {} required identifiers, {} inline endpoints",
            graph.units.len(),
            graph.all_identifiers.len(),
            graph.inline_endpoints.len()
        );

        graph
    }

    fn record_inline_endpoint(&mut self, identifier: &str, endpoint: String) {
        if self.inline_endpoints.iter().any(|(id, _)| id == identifier) {
            debug!("Keeping first endpoint for '{}', ignoring {}", identifier, endpoint);
            return;
        }
        self.inline_endpoints.push((identifier.to_string(), endpoint));
    }

    /// Ids of the units requiring `identifier`.
    pub fn dependents_of(&self, identifier: &str) -> &BTreeSet<String> {
        self.dependents_of.get(identifier).unwrap_or(&EMPTY)
    }

    /// Identifiers required by the unit with id `unit_id`.
    ///
    /// Every known unit has an entry, possibly empty; unknown ids yield an empty set.
    pub fn dependencies_of(&self, unit_id: &str) -> &BTreeSet<String> {
        self.dependencies_of.get(unit_id).unwrap_or(&EMPTY)
    }

    /// Identifiers of all installed units.
    pub fn installed_identifiers(&self) -> BTreeSet<String> {
        self.slug_index.keys().cloned().collect()
    }

    /// Every identifier required by at least one unit.
    pub fn required_identifiers(&self) -> &BTreeSet<String> {
        &self.all_identifiers
    }

    /// Identifiers that are required but not installed.
    pub fn installed_vs_required(&self) -> BTreeSet<String> {
        self.all_identifiers
            .iter()
            .filter(|identifier| !self.slug_index.contains_key(*identifier))
            .cloned()
            .collect()
    }

    /// Required identifiers that are installed, mapped to the providing unit's id.
    pub fn dependency_filepaths(&self) -> BTreeMap<String, String> {
        self.all_identifiers
            .iter()
            .filter_map(|identifier| {
                self.slug_index.get(identifier).map(|unit_id| (identifier.clone(), unit_id.clone()))
            })
            .collect()
    }

    /// The installed unit providing `identifier`.
    ///
    /// Looks up the slug first; otherwise falls back to the last unit whose id
    /// contains the identifier.
    pub fn unit_for_identifier(&self, identifier: &str) -> Option<&Unit> {
        if let Some(unit_id) = self.slug_index.get(identifier) {
            return self.unit(unit_id);
        }
        if identifier.is_empty() {
            return None;
        }
        self.units.iter().rev().find(|unit| unit.id.contains(identifier))
    }

    /// Installed unit by id.
    pub fn unit(&self, unit_id: &str) -> Option<&Unit> {
        self.unit_index.get(unit_id).map(|&index| &self.units[index])
    }

    /// Installed units in host enumeration order.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Inline endpoint overrides captured while parsing, first writer per identifier.
    pub fn inline_endpoints(&self) -> &[(String, String)] {
        &self.inline_endpoints
    }

    /// Every `(unit_id, identifier)` edge, ordered by unit id then identifier.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dependencies_of.iter().flat_map(|(unit_id, identifiers)| {
            identifiers.iter().map(move |identifier| (unit_id.as_str(), identifier.as_str()))
        })
    }

    /// Every `(identifier, unit_id)` pair from the reverse map.
    pub fn reverse_edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dependents_of.iter().flat_map(|(identifier, unit_ids)| {
            unit_ids.iter().map(move |unit_id| (identifier.as_str(), unit_id.as_str()))
        })
    }

    /// Number of installed units.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.dependencies_of.values().map(BTreeSet::len).sum()
    }

    /// Whether the graph holds no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Build a dependency graph from installed units.
pub fn build_graph(units: impl IntoIterator<Item = Unit>) -> DependencyGraph {
    DependencyGraph::build(units)
}

/// Ids of the units requiring `identifier`.
pub fn dependents_of(graph: &DependencyGraph, identifier: &str) -> BTreeSet<String> {
    graph.dependents_of(identifier).clone()
}

/// Identifiers required but not provided by any installed unit.
pub fn installed_vs_required(graph: &DependencyGraph) -> BTreeSet<String> {
    graph.installed_vs_required()
}

//! Cycle detection over the dependency graph.
//!
//! Cycles are found between identifiers: an installed unit stands for its own
//! slug, and each of its requirements is an edge from that slug. Two policies
//! are offered:
//!
//! - [`find_cycles`] reports mutual pairs only (A requires B and B requires A),
//!   which is what hosts show to users.
//! - [`find_cycle_paths`] runs a depth-first walk with a recursion stack and
//!   reports closed walks of any length ≥ 2.
//!
//! Both drop self-loops and deduplicate cycles by member set, so `(a, b)` and
//! `(b, a)` are reported once, in order of first discovery.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use super::DependencyGraph;

/// A closed walk of ≥ 2 distinct identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cycle {
    members: Vec<String>,
}

impl Cycle {
    /// Cycle members in walk order; the walk closes back to the first member.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Number of identifiers in the cycle.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; cycles have at least two members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `identifier` takes part in the cycle.
    pub fn contains(&self, identifier: &str) -> bool {
        self.members.iter().any(|member| member == identifier)
    }

    /// Order-independent identity of the cycle.
    pub fn member_set(&self) -> BTreeSet<&str> {
        self.members.iter().map(String::as_str).collect()
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.members.join(" → "))?;
        if let Some(first) = self.members.first() {
            write!(f, " → {first}")?;
        }
        Ok(())
    }
}

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Identifier-level view of a [`DependencyGraph`].
struct IdentifierGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl IdentifierGraph {
    fn from_dependency_graph(dependencies: &DependencyGraph) -> Self {
        let mut this = Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        };

        let mut units: Vec<_> = dependencies.units().iter().collect();
        units.sort_by(|a, b| a.id.cmp(&b.id));

        for unit in units {
            let from = this.ensure_node(unit.slug());
            for identifier in dependencies.dependencies_of(&unit.id) {
                let to = this.ensure_node(identifier.clone());
                if from != to && !this.graph.contains_edge(from, to) {
                    this.graph.add_edge(from, to, ());
                }
            }
        }

        this
    }

    fn ensure_node(&mut self, identifier: String) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&identifier) {
            index
        } else {
            let index = self.graph.add_node(identifier.clone());
            self.node_map.insert(identifier, index);
            index
        }
    }

    /// Neighbors in edge insertion order (petgraph yields newest first).
    fn ordered_neighbors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut neighbors: Vec<_> = self.graph.neighbors(node).collect();
        neighbors.reverse();
        neighbors
    }

    fn mutual_pairs(&self) -> Vec<Cycle> {
        let mut cycles = Vec::new();
        for from in self.graph.node_indices() {
            for to in self.ordered_neighbors(from) {
                if from != to && self.graph.contains_edge(to, from) {
                    cycles.push(Cycle {
                        members: vec![self.graph[from].clone(), self.graph[to].clone()],
                    });
                }
            }
        }
        cycles
    }

    fn back_edge_cycles(&self) -> Vec<Cycle> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|node| (node, Color::White)).collect();
        let mut path = Vec::new();
        let mut cycles = Vec::new();

        for node in self.graph.node_indices() {
            if matches!(colors.get(&node), Some(Color::White)) {
                self.dfs_visit(node, &mut colors, &mut path, &mut cycles);
            }
        }

        cycles
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
        cycles: &mut Vec<Cycle>,
    ) {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.ordered_neighbors(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    if let Some(start) = path.iter().position(|&n| n == neighbor) {
                        let members: Vec<String> =
                            path[start..].iter().map(|&n| self.graph[n].clone()).collect();
                        if members.len() >= 2 {
                            cycles.push(Cycle {
                                members,
                            });
                        }
                    }
                }
                Some(Color::White) => self.dfs_visit(neighbor, colors, path, cycles),
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
    }
}

/// Drop degenerate entries and repeated member sets, keeping first discovery order.
fn dedup_cycles(cycles: Vec<Cycle>) -> Vec<Cycle> {
    let mut seen: HashSet<BTreeSet<String>> = HashSet::new();
    cycles
        .into_iter()
        .filter(|cycle| {
            let set: BTreeSet<String> = cycle.members.iter().cloned().collect();
            set.len() >= 2 && seen.insert(set)
        })
        .collect()
}

/// Mutual requirement pairs, deduplicated and self-loop free.
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Cycle> {
    dedup_cycles(IdentifierGraph::from_dependency_graph(graph).mutual_pairs())
}

/// Cycles of any length found by a depth-first walk.
///
/// Every back edge to an identifier still on the recursion stack reports the
/// stack suffix starting at that identifier.
pub fn find_cycle_paths(graph: &DependencyGraph) -> Vec<Cycle> {
    dedup_cycles(IdentifierGraph::from_dependency_graph(graph).back_edge_cycles())
}

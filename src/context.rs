//! One resolution context: graph, endpoint registry and shared cache.
//!
//! [`DependencyContext`] replaces process-wide state with explicit values.
//! Rebuilding swaps in a new graph and registry wholesale; since both hold
//! `Arc`s, resolvers created before a rebuild keep reading the snapshot they
//! started with. The metadata cache outlives rebuilds.

use anyhow::Result;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::cache::MetadataCache;
use crate::core::Unit;
use crate::fetch::Fetcher;
use crate::graph::{Cycle, DependencyGraph, find_cycles};
use crate::host::UnitSource;
use crate::metadata::MetadataRecord;
use crate::resolver::{MetadataResolver, ResolverOptions};
use crate::source::{EndpointProvider, SourceRegistry};

/// Owns everything one host needs for dependency checks and metadata lookups.
pub struct DependencyContext {
    graph: Option<Arc<DependencyGraph>>,
    registry: Option<Arc<SourceRegistry>>,
    default_endpoints: Vec<(String, String)>,
    cache: Arc<MetadataCache>,
    fetcher: Arc<dyn Fetcher>,
    options: ResolverOptions,
}

impl DependencyContext {
    /// Context with no graph built yet.
    pub fn new(cache: Arc<MetadataCache>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            graph: None,
            registry: None,
            default_endpoints: Vec::new(),
            cache,
            fetcher,
            options: ResolverOptions::default(),
        }
    }

    /// Register the host's default endpoints, used from the next rebuild on.
    #[must_use]
    pub fn with_endpoints(mut self, provider: &dyn EndpointProvider) -> Self {
        self.default_endpoints = provider.default_endpoints();
        self
    }

    /// Resolver options for every resolver this context hands out.
    #[must_use]
    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the graph and registry with ones built from `units`.
    pub fn build_graph(&mut self, units: Vec<Unit>) -> &DependencyGraph {
        let graph = DependencyGraph::build(units);
        let registry = SourceRegistry::from_graph(&graph).with_provider(&self.default_endpoints);
        self.registry = Some(Arc::new(registry));
        self.graph.insert(Arc::new(graph))
    }

    /// Re-enumerate units from `source` and rebuild.
    pub fn rebuild(&mut self, source: &dyn UnitSource) -> Result<&DependencyGraph> {
        let units = source.enumerate_units()?;
        Ok(self.build_graph(units))
    }

    /// Whether a graph has been built.
    pub fn is_built(&self) -> bool {
        self.graph.is_some()
    }

    /// The current graph.
    ///
    /// # Panics
    ///
    /// Panics when called before [`build_graph`](Self::build_graph) or
    /// [`rebuild`](Self::rebuild). Querying an unbuilt graph is a programming
    /// error, not a runtime condition.
    pub fn graph(&self) -> &DependencyGraph {
        match &self.graph {
            Some(graph) => graph,
            None => panic!("dependency graph queried before it was built"),
        }
    }

    /// The current endpoint registry.
    ///
    /// # Panics
    ///
    /// Panics when no graph has been built.
    pub fn registry(&self) -> &SourceRegistry {
        match &self.registry {
            Some(registry) => registry,
            None => panic!("source registry queried before the graph was built"),
        }
    }

    /// Mutual requirement pairs in the current graph.
    pub fn find_cycles(&self) -> Vec<Cycle> {
        find_cycles(self.graph())
    }

    /// Ids of the units requiring `identifier`.
    pub fn dependents_of(&self, identifier: &str) -> BTreeSet<String> {
        self.graph().dependents_of(identifier).clone()
    }

    /// Identifiers required but not installed.
    pub fn installed_vs_required(&self) -> BTreeSet<String> {
        self.graph().installed_vs_required()
    }

    /// Resolver over the current graph and registry.
    ///
    /// # Panics
    ///
    /// Panics when no graph has been built.
    pub fn resolver(&self) -> MetadataResolver {
        let (Some(graph), Some(registry)) = (&self.graph, &self.registry) else {
            panic!("resolver requested before the graph was built");
        };
        MetadataResolver::new(graph.clone(), registry.clone(), self.cache.clone(), self.fetcher.clone())
            .with_options(self.options.clone())
    }

    /// Metadata for `identifier`.
    pub async fn resolve(&self, identifier: &str) -> MetadataRecord {
        self.resolver().resolve(identifier).await
    }

    /// The shared metadata cache.
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockFetcher, unit};

    fn context() -> DependencyContext {
        DependencyContext::new(Arc::new(MetadataCache::new()), Arc::new(MockFetcher::new()))
    }

    #[test]
    #[should_panic(expected = "before it was built")]
    fn test_unbuilt_graph_panics() {
        let ctx = context();
        let _ = ctx.installed_vs_required();
    }

    #[test]
    fn test_build_and_query() {
        let mut ctx = context();
        assert!(!ctx.is_built());
        ctx.build_graph(vec![unit("a/a.php", "b"), unit("b/b.php", "a, c")]);

        assert!(ctx.is_built());
        assert_eq!(ctx.find_cycles().len(), 1);
        assert!(ctx.dependents_of("a").contains("b/b.php"));
        assert_eq!(ctx.installed_vs_required().into_iter().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn test_rebuild_replaces_graph_wholesale() {
        let mut ctx = context();
        ctx.build_graph(vec![unit("a/a.php", "b")]);
        ctx.rebuild(&vec![unit("c/c.php", "d")]).unwrap();

        assert!(ctx.graph().unit("a/a.php").is_none());
        assert!(ctx.dependents_of("b").is_empty());
        assert!(ctx.dependents_of("d").contains("c/c.php"));
    }

    #[test]
    fn test_default_endpoints_feed_registry() {
        let defaults = vec![("b".to_string(), "https://registry.example/b".to_string())];
        let mut ctx = context().with_endpoints(&defaults);
        ctx.build_graph(vec![unit("a/a.php", "b")]);
        assert_eq!(ctx.registry().resolve_endpoints("b"), vec!["https://registry.example/b"]);
    }

    #[tokio::test]
    async fn test_resolve_without_sources() {
        let mut ctx = context();
        ctx.build_graph(vec![unit("a/a.php", "b")]);
        let record = ctx.resolve("b").await;
        assert!(record.is_synthesized());
        assert_eq!(record.name, "b");
    }
}

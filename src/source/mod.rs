//! Metadata source endpoints per dependency identifier.
//!
//! Endpoints come from two places:
//!
//! 1. **Inline overrides** parsed from `identifier|endpoint` tokens while the graph
//!    is built. The first override seen for an identifier wins.
//! 2. **Default endpoints** registered by the host through an [`EndpointProvider`]
//!    (for example a public plugin registry query), kept in registration order.
//!
//! [`SourceRegistry::resolve_endpoints`] returns the candidates in that priority
//! order, keeping only endpoints whose URL contains the identifier. That cheap
//! check rejects mismatched entries a host may have bulk-registered.

use std::collections::HashMap;
use tracing::debug;

use crate::graph::DependencyGraph;

/// Host extension point supplying default endpoints.
///
/// Returns `(identifier, endpoint)` pairs in the order they should be tried.
pub trait EndpointProvider {
    /// Default endpoints to register after inline overrides.
    fn default_endpoints(&self) -> Vec<(String, String)>;
}

impl EndpointProvider for Vec<(String, String)> {
    fn default_endpoints(&self) -> Vec<(String, String)> {
        self.clone()
    }
}

impl EndpointProvider for HashMap<String, String> {
    /// Sorted by identifier, since a map carries no registration order.
    fn default_endpoints(&self) -> Vec<(String, String)> {
        let mut endpoints: Vec<_> = self.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        endpoints.sort();
        endpoints
    }
}

/// Endpoint map for one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    inline: HashMap<String, String>,
    inline_order: Vec<String>,
    defaults: Vec<(String, String)>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the inline overrides captured by `graph`.
    pub fn from_graph(graph: &DependencyGraph) -> Self {
        let mut registry = Self::new();
        for (identifier, endpoint) in graph.inline_endpoints() {
            registry.register_inline(identifier, endpoint);
        }
        registry
    }

    /// Add every default endpoint supplied by `provider`.
    #[must_use]
    pub fn with_provider(mut self, provider: &dyn EndpointProvider) -> Self {
        for (identifier, endpoint) in provider.default_endpoints() {
            self.register_default(identifier, endpoint);
        }
        self
    }

    /// Register an inline override.
    ///
    /// Returns `false` and leaves the registry untouched when the identifier
    /// already has one.
    pub fn register_inline(&mut self, identifier: &str, endpoint: &str) -> bool {
        if self.inline.contains_key(identifier) {
            return false;
        }
        self.inline.insert(identifier.to_string(), endpoint.to_string());
        self.inline_order.push(identifier.to_string());
        true
    }

    /// Register a default endpoint, tried after any inline override.
    pub fn register_default(&mut self, identifier: impl Into<String>, endpoint: impl Into<String>) {
        self.defaults.push((identifier.into(), endpoint.into()));
    }

    /// The inline override for `identifier`, if any.
    pub fn inline_endpoint(&self, identifier: &str) -> Option<&str> {
        self.inline.get(identifier).map(String::as_str)
    }

    /// Identifiers carrying an inline override, in registration order.
    pub fn inline_identifiers(&self) -> &[String] {
        &self.inline_order
    }

    /// Candidate endpoints for `identifier` in priority order.
    ///
    /// An empty list means there is no remote source and the metadata must be
    /// synthesized.
    pub fn resolve_endpoints(&self, identifier: &str) -> Vec<String> {
        let inline = self.inline.get(identifier).into_iter();
        let defaults =
            self.defaults.iter().filter(|(id, _)| id == identifier).map(|(_, endpoint)| endpoint);

        let mut candidates: Vec<String> = Vec::new();
        for endpoint in inline.chain(defaults) {
            if !endpoint_matches(endpoint, identifier) {
                debug!("Rejecting endpoint {} for '{}': identifier not in URL", endpoint, identifier);
                continue;
            }
            if !candidates.iter().any(|c| c == endpoint) {
                candidates.push(endpoint.clone());
            }
        }
        candidates
    }

    /// Whether no endpoint at all is registered.
    pub fn is_empty(&self) -> bool {
        self.inline.is_empty() && self.defaults.is_empty()
    }
}

/// Whether `endpoint` is plausibly a source for `identifier`.
pub fn endpoint_matches(endpoint: &str, identifier: &str) -> bool {
    !identifier.is_empty() && endpoint.contains(identifier)
}

/// Resolve a relative `.json` endpoint against the declaring unit's directory URL.
///
/// Endpoints starting with `http` and endpoints that do not end with `.json`
/// are returned as written, as are all endpoints when no base URL is known.
pub fn resolve_relative_endpoint(endpoint: &str, base_url: Option<&str>) -> String {
    match base_url {
        Some(base) if !endpoint.starts_with("http") && endpoint.ends_with(".json") => {
            format!("{}/{}", base.trim_end_matches('/'), endpoint.trim_start_matches('/'))
        }
        _ => endpoint.to_string(),
    }
}

//! Metadata resolution for dependency identifiers.
//!
//! [`MetadataResolver::resolve`] never fails. For one identifier it:
//!
//! 1. returns a live [`MetadataCache`] entry when there is one;
//! 2. otherwise tries each endpoint from [`SourceRegistry::resolve_endpoints`]
//!    strictly in priority order, each bounded by the fetch timeout, and caches
//!    the first structurally valid payload with the metadata TTL;
//! 3. otherwise synthesizes a placeholder record and caches it with the much
//!    shorter synthesized TTL, so a source that later comes online is picked
//!    up on a following pass.
//!
//! Failed, timed-out and error-marked fetches all fall through to the next
//! candidate. Nothing here mutates the graph or the registry.
//!
//! # Concurrency
//!
//! [`MetadataResolver::resolve_all`] fans out over identifiers with
//! `buffer_unordered`, bounded by `max_concurrency`. Endpoint probing within
//! one identifier stays sequential. Results are sorted by identifier once all
//! resolutions complete, since completion order is arbitrary.

use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::MetadataCache;
use crate::constants::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_METADATA_TTL, DEFAULT_SYNTHESIZED_TTL, default_max_concurrency,
};
use crate::fetch::{FetchError, Fetcher};
use crate::graph::DependencyGraph;
use crate::metadata::{MetadataRecord, decode_payload};
use crate::source::SourceRegistry;
use crate::utils::progress::ProgressBar;

/// Tunables for one resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Lifetime of fetched records in the cache.
    pub metadata_ttl: Duration,
    /// Lifetime of synthesized records; zero disables caching them.
    pub synthesized_ttl: Duration,
    /// Bound on each individual fetch.
    pub fetch_timeout: Duration,
    /// Maximum identifiers resolved at once by [`MetadataResolver::resolve_all`].
    pub max_concurrency: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            metadata_ttl: DEFAULT_METADATA_TTL,
            synthesized_ttl: DEFAULT_SYNTHESIZED_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Records produced by one [`MetadataResolver::resolve_all`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSet {
    records: Vec<MetadataRecord>,
}

impl ResolvedSet {
    fn new(mut records: Vec<MetadataRecord>) -> Self {
        records.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Self {
            records,
        }
    }

    /// Records sorted by identifier.
    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    /// Record for `identifier`, if it was part of the set.
    pub fn get(&self, identifier: &str) -> Option<&MetadataRecord> {
        self.records
            .binary_search_by(|record| record.identifier.as_str().cmp(identifier))
            .ok()
            .map(|index| &self.records[index])
    }

    /// Number of records that came from a source.
    pub fn fetched_count(&self) -> usize {
        self.records.iter().filter(|record| !record.is_synthesized()).count()
    }

    /// Number of placeholder records.
    pub fn synthesized_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_synthesized()).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Produces a [`MetadataRecord`] for any identifier.
///
/// Holds read-only views of one pass's graph and registry plus the shared
/// cache. Cheap to clone.
#[derive(Clone)]
pub struct MetadataResolver {
    graph: Arc<DependencyGraph>,
    registry: Arc<SourceRegistry>,
    cache: Arc<MetadataCache>,
    fetcher: Arc<dyn Fetcher>,
    options: ResolverOptions,
}

impl MetadataResolver {
    /// Resolver with default options.
    pub fn new(
        graph: Arc<DependencyGraph>,
        registry: Arc<SourceRegistry>,
        cache: Arc<MetadataCache>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            graph,
            registry,
            cache,
            fetcher,
            options: ResolverOptions::default(),
        }
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Metadata for `identifier`; synthesized when no source succeeds.
    pub async fn resolve(&self, identifier: &str) -> MetadataRecord {
        if let Some(record) = self.cache.get(identifier) {
            return record;
        }

        let endpoints = self.registry.resolve_endpoints(identifier);
        for endpoint in &endpoints {
            match self.fetch_record(identifier, endpoint).await {
                Ok(record) => {
                    debug!("Resolved '{}' from {}", identifier, endpoint);
                    self.cache.put(identifier, record.clone(), self.options.metadata_ttl);
                    return record;
                }
                Err(e) => warn!("Metadata for '{}' unavailable from {}: {}", identifier, endpoint, e),
            }
        }

        if endpoints.is_empty() {
            info!("No metadata source for '{}', synthesizing a placeholder", identifier);
        } else {
            info!(
                "All {} metadata sources failed for '{}', synthesizing a placeholder",
                endpoints.len(),
                identifier
            );
        }

        let record = MetadataRecord::synthesized(identifier, self.graph.unit_for_identifier(identifier));
        self.cache.put(identifier, record.clone(), self.options.synthesized_ttl);
        record
    }

    async fn fetch_record(&self, identifier: &str, endpoint: &str) -> Result<MetadataRecord, FetchError> {
        let timeout = self.options.fetch_timeout;
        let bytes = tokio::time::timeout(timeout, self.fetcher.fetch(endpoint, timeout)).await.map_err(
            |_| FetchError::Timeout {
                endpoint: endpoint.to_string(),
                timeout,
            },
        )??;
        decode_payload(identifier, &bytes).into_result()
    }

    /// Resolve every identifier once, concurrently.
    ///
    /// Duplicates are resolved once. `progress`, when given, advances by one
    /// per identifier.
    pub async fn resolve_all<I, S>(&self, identifiers: I, progress: Option<&ProgressBar>) -> ResolvedSet
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identifiers: BTreeSet<String> = identifiers.into_iter().map(Into::into).collect();
        let concurrency = self.options.max_concurrency.max(1);
        debug!("Resolving {} identifiers with concurrency {}", identifiers.len(), concurrency);

        let records: Vec<MetadataRecord> = stream::iter(identifiers)
            .map(|identifier| async move {
                let record = self.resolve(&identifier).await;
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                record
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        ResolvedSet::new(records)
    }

    /// Resolve every identifier required by at least one installed unit.
    pub async fn resolve_required(&self, progress: Option<&ProgressBar>) -> ResolvedSet {
        let identifiers: Vec<String> = self.graph.required_identifiers().iter().cloned().collect();
        self.resolve_all(identifiers, progress).await
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }
}

//! plugin-deps - plugin dependency resolution
//!
//! Resolves declarative "requires" relationships between installed plugins,
//! builds the dependency graph they form, reports cycles and missing
//! dependencies, and resolves descriptive metadata for each dependency from
//! remote or local sources, falling back to synthesized placeholders when no
//! source answers.
//!
//! # Architecture Overview
//!
//! One resolution pass flows leaf-first through:
//!
//! 1. [`requirement`] - parses `identifier` / `identifier|endpoint` tokens
//! 2. [`graph`] - builds the dependent/dependency maps from a unit snapshot
//! 3. [`graph::cycles`] - detects mutual requirement pairs (and longer walks)
//! 4. [`source`] - orders candidate endpoints per identifier
//! 5. [`cache`] - TTL cache of metadata records keyed by identifier
//! 6. [`resolver`] - fetches, caches, or synthesizes a record per identifier
//!
//! [`context::DependencyContext`] bundles one pass's graph and registry with
//! the long-lived cache and fetcher.
//!
//! # Host Interfaces
//!
//! The host supplies:
//! - units, through [`host::UnitSource`]
//! - transport, through [`fetch::Fetcher`] ([`fetch::HttpFetcher`] is the stock one)
//! - default endpoints, through [`source::EndpointProvider`]
//! - time, through [`cache::Clock`]
//!
//! # Example
//!
//! ```rust,no_run
//! use plugin_deps::cache::MetadataCache;
//! use plugin_deps::context::DependencyContext;
//! use plugin_deps::core::Unit;
//! use plugin_deps::fetch::HttpFetcher;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut context = DependencyContext::new(Arc::new(MetadataCache::new()), Arc::new(HttpFetcher::new()?));
//! context.build_graph(vec![
//!     Unit::new("a/a.php", "A").with_requires("b, ext|https://example.com/ext.json"),
//!     Unit::new("b/b.php", "B").with_requires("a"),
//! ]);
//!
//! for cycle in context.find_cycles() {
//!     println!("cycle: {cycle}");
//! }
//! for identifier in context.installed_vs_required() {
//!     let record = context.resolve(&identifier).await;
//!     println!("{} (synthesized: {})", record.name, record.is_synthesized());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Supporting Modules
//!
//! - [`cli`] - the `plugin-deps` command-line interface
//! - [`config`] - `~/.plugin-deps/config.toml`
//! - [`constants`] - TTLs, timeouts and fixed text
//! - [`core`] - error types and the [`core::Unit`] model
//! - [`install`] - install directory correction for extracted archives
//! - [`metadata`] - metadata records and payload decoding
//! - [`utils`] - atomic file writes and progress bars

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod context;
pub mod core;
pub mod fetch;
pub mod graph;
pub mod host;
pub mod install;
pub mod metadata;
pub mod requirement;
pub mod resolver;
pub mod source;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use graph::{build_graph, dependents_of, find_cycles, installed_vs_required};

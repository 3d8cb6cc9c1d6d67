//! Integration test suite for plugin-deps
//!
//! End-to-end tests that drive the public library API and the `plugin-deps`
//! binary. Network access is never required: the library tests script
//! responses through `MockFetcher`, and the CLI tests serve metadata from
//! `file://` endpoints inside a temporary directory.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **end_to_end**: graph, cycle detection and metadata resolution through `DependencyContext`
//! - **cache_persistence**: cache snapshots saved and reloaded across passes
//! - **cli**: the `plugin-deps` binary and its output formats

mod cache_persistence;
mod cli;
mod end_to_end;

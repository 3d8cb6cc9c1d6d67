//! Test utilities for plugin-deps
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration tests:
//!
//! - [`ManualClock`] - a clock that only moves when told to
//! - [`MockFetcher`] - scripted endpoint responses with a call log
//! - [`unit`] - shorthand for a [`Unit`] with a requirement declaration
//! - [`init_test_logging`] - one-time tracing setup honoring `RUST_LOG`
//!
//! # Example
//!
//! ```rust,ignore
//! use plugin_deps::test_utils::{MockFetcher, unit};
//!
//! let fetcher = MockFetcher::new().with_json("https://example.com/ext.json", r#"{"name":"Ext"}"#);
//! let units = vec![unit("a/a.php", "ext|https://example.com/ext.json")];
//! ```

pub mod clock;
pub mod fetcher;

pub use clock::ManualClock;
pub use fetcher::MockFetcher;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::core::Unit;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=plugin_deps=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A unit named after its id with the given requirement declaration.
pub fn unit(id: &str, requires: &str) -> Unit {
    Unit::new(id, id).with_requires(requires)
}

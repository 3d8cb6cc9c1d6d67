//! Time source for cache expiry.

use chrono::{DateTime, Utc};

/// Supplies the current time to the metadata cache.
///
/// Injected so TTL behavior can be tested without sleeping.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

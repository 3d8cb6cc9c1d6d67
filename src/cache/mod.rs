//! Time-bounded metadata cache keyed by dependency identifier.
//!
//! An entry is usable only while `now < fetched_at + ttl`, with `now` taken
//! from an injected [`Clock`]. Expired entries read as absent; they are
//! evicted lazily on the next write or dropped when a snapshot is loaded, and
//! there is no background sweep.
//!
//! Keys are identifiers, never endpoints: switching a dependency's source
//! after a successful fetch keeps the cached record until [`MetadataCache::invalidate`]
//! is called.
//!
//! # Concurrency
//!
//! The map is a [`DashMap`], so concurrent resolution workers read without
//! blocking each other and writes are exclusive per shard. No method holds a
//! map guard across another map call.
//!
//! # Persistence
//!
//! [`MetadataCache::save_to`] writes a JSON snapshot atomically and
//! [`MetadataCache::load_from`] reads it back, skipping entries that expired
//! in between:
//!
//! ```json
//! {
//!   "version": 2,
//!   "entries": [
//!     { "identifier": "ext", "record": { ... }, "fetched_at": "2024-05-01T10:00:00Z", "ttl_millis": 43200000 }
//!   ]
//! }
//! ```

pub mod clock;

pub use clock::{Clock, SystemClock};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::core::PluginDepsError;
use crate::metadata::MetadataRecord;
use crate::utils::fs::atomic_write;

/// Snapshot format version.
const SNAPSHOT_VERSION: u32 = 2;

/// One cached record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub identifier: String,
    pub record: MetadataRecord,
    pub fetched_at: DateTime<Utc>,
    /// Lifetime in milliseconds, rounded up from the requested TTL.
    pub ttl_millis: u64,
}

impl CacheEntry {
    /// Moment the entry stops being usable; `None` when it never does.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = TimeDelta::try_milliseconds(i64::try_from(self.ttl_millis).ok()?)?;
        self.fetched_at.checked_add_signed(ttl)
    }

    /// Whether the entry is usable at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|expires_at| now < expires_at)
    }
}

fn ttl_to_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    #[serde(default)]
    entries: Vec<CacheEntry>,
}

/// Concurrent identifier → record store with per-entry TTL.
pub struct MetadataCache {
    entries: DashMap<String, CacheEntry>,
    clock: Arc<dyn Clock>,
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache").field("entries", &self.entries.len()).finish_non_exhaustive()
    }
}

impl MetadataCache {
    /// Empty cache on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Empty cache on the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Live record for `identifier`, if any.
    pub fn get(&self, identifier: &str) -> Option<MetadataRecord> {
        let now = self.clock.now();
        let entry = self.entries.get(identifier)?;
        if entry.is_live(now) {
            debug!("Cache hit for '{}'", identifier);
            Some(entry.record.clone())
        } else {
            debug!("Cache entry for '{}' expired", identifier);
            None
        }
    }

    /// Store `record` under `identifier` for `ttl`.
    ///
    /// A zero TTL stores nothing. Sub-millisecond remainders round up, so an
    /// entry never expires before `ttl` has elapsed. Expired entries are
    /// evicted first.
    pub fn put(&self, identifier: &str, record: MetadataRecord, ttl: Duration) {
        let ttl_millis = ttl_to_millis(ttl);
        if ttl_millis == 0 {
            debug!("Not caching '{}': zero TTL", identifier);
            return;
        }

        let now = self.clock.now();
        self.entries.retain(|_, entry| entry.is_live(now));
        self.entries.insert(
            identifier.to_string(),
            CacheEntry {
                identifier: identifier.to_string(),
                record,
                fetched_at: now,
                ttl_millis,
            },
        );
    }

    /// Drop the entry for `identifier`; returns whether one existed.
    pub fn invalidate(&self, identifier: &str) -> bool {
        self.entries.remove(identifier).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Evict expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries.iter().filter(|entry| entry.is_live(now)).count()
    }

    /// Whether there is no live entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live entries sorted by identifier.
    pub fn entries(&self) -> Vec<CacheEntry> {
        let now = self.clock.now();
        let mut entries: Vec<CacheEntry> =
            self.entries.iter().filter(|entry| entry.is_live(now)).map(|entry| entry.value().clone()).collect();
        entries.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        entries
    }

    /// Write the live entries to `path` as a JSON snapshot.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            entries: self.entries(),
        };
        let content = serde_json::to_vec_pretty(&snapshot).context("Failed to serialize metadata cache")?;

        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || atomic_write(&target, &content))
            .await
            .context("Cache writer task failed")?
            .map_err(|e| PluginDepsError::CacheError {
                operation: "write".to_string(),
                path: path.display().to_string(),
                reason: format!("{e:#}"),
            })?;

        debug!("Saved {} cache entries to {}", snapshot.entries.len(), path.display());
        Ok(())
    }

    /// Load a snapshot from `path` on the given clock.
    ///
    /// A missing file yields an empty cache. Entries already expired at load
    /// time are dropped.
    pub async fn load_from(path: &Path, clock: Arc<dyn Clock>) -> Result<Self> {
        let cache = Self::with_clock(clock);
        if !path.exists() {
            return Ok(cache);
        }

        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read metadata cache: {}", path.display()))?;
        let snapshot: Snapshot =
            serde_json::from_slice(&content).map_err(|e| PluginDepsError::CacheError {
                operation: "read".to_string(),
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PluginDepsError::CacheError {
                operation: "read".to_string(),
                path: path.display().to_string(),
                reason: format!("unsupported snapshot version {}", snapshot.version),
            }
            .into());
        }

        let now = cache.clock.now();
        let total = snapshot.entries.len();
        for entry in snapshot.entries.into_iter().filter(|entry| entry.is_live(now)) {
            cache.entries.insert(entry.identifier.clone(), entry);
        }
        debug!("Loaded {} of {} cache entries from {}", cache.entries.len(), total, path.display());

        Ok(cache)
    }
}

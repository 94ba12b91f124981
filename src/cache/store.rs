//! Cache storage.
//!
//! Defines the key-value contract the renderer runs against and a bounded
//! in-memory implementation used when the host brings no store of its own.

use std::num::NonZeroUsize;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use lru::LruCache;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use super::config::CacheConfig;

const SOURCE: &str = "cache::store";

/// Errors surfaced by store implementations.
///
/// The renderer treats every variant as non-fatal and fails open. The
/// taxonomy exists for hosts backing the trait with real infrastructure,
/// so their own logs and metrics can tell an outage from a refused call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend unavailable: {message}")]
    Unavailable { message: String },
    #[error("store operation failed: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Key-value contract for cached render output.
///
/// Implementations must treat `ttl_seconds == 0` as "no expiry" and must
/// not hand back expired entries from `get` or `keys_with_prefix`.
pub trait KeyValueStore: Send + Sync {
    /// Fetch a live entry. `Ok(None)` is a miss.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or replace an entry.
    fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError>;

    /// Remove an entry, reporting whether it existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// List live keys starting with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    expires_at: Option<OffsetDateTime>,
}

impl StoredEntry {
    fn new(value: &str, ttl_seconds: u64) -> Self {
        // A TTL too large for the calendar is indistinguishable from no expiry.
        let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
        let expires_at = (ttl_seconds > 0)
            .then(|| OffsetDateTime::now_utc().checked_add(Duration::seconds(ttl)))
            .flatten();

        Self {
            value: value.to_string(),
            expires_at,
        }
    }

    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Bounded in-memory store on an LRU map.
///
/// Capacity pressure evicts the least-recently-used entry; expiry is lazy
/// and happens on the read path. A panic in another thread leaves the lock
/// poisoned, which is recovered with a warning instead of propagated.
pub struct MemoryStore {
    entries: RwLock<LruCache<String, StoredEntry>>,
}

impl MemoryStore {
    /// Create a store sized by the cache configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_capacity(config.memory_entry_limit_non_zero())
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Number of entries currently held. Lazily expired entries still count
    /// until a read prunes them.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn force_expire(&self, key: &str) {
        let mut entries = rw_write(&self.entries, "force_expire");
        if let Some(entry) = entries.peek_mut(key) {
            entry.expires_at = Some(OffsetDateTime::now_utc() - Duration::seconds(1));
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = rw_write(&self.entries, "get");
        let now = OffsetDateTime::now_utc();

        let cached = entries
            .get(key)
            .map(|entry| (entry.value.clone(), entry.is_expired(now)));

        match cached {
            Some((_, true)) => {
                entries.pop(key);
                Ok(None)
            }
            Some((value, false)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let entry = StoredEntry::new(value, ttl_seconds);
        let mut entries = rw_write(&self.entries, "set");

        if let Some((evicted_key, _)) = entries.push(key.to_string(), entry) {
            if evicted_key != key {
                debug!(
                    source = SOURCE,
                    evicted_key = %evicted_key,
                    "Entry evicted at capacity"
                );
            }
        }

        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(rw_write(&self.entries, "delete").pop(key).is_some())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let entries = rw_read(&self.entries, "keys_with_prefix");
        let now = OffsetDateTime::now_utc();

        Ok(entries
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

fn rw_read<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                source = SOURCE,
                lock_kind = "rwlock.read",
                result = "poisoned_recovered",
                hint = "state may be stale after panic in another thread",
                "Recovered from poisoned store lock"
            );
            poisoned.into_inner()
        }
    }
}

fn rw_write<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                source = SOURCE,
                lock_kind = "rwlock.write",
                result = "poisoned_recovered",
                hint = "state may be stale after panic in another thread",
                "Recovered from poisoned store lock"
            );
            poisoned.into_inner()
        }
    }
}

//! Key/value cache with per-entry expiry and prefix invalidation.
//!
//! Entries live until their TTL elapses; there is no count-based eviction
//! because the key space is bounded by the queries actually visited in a
//! session. Expired entries are purged lazily when they are looked up.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    data: V,
    written_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Valid while `now - written_at <= ttl`
    fn is_valid(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.written_at) <= self.ttl
    }
}

/// TTL cache keyed by opaque strings
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
}

impl<V> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Store `value`, replacing any existing entry for `key`
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        self.set_at(key, value, ttl, Instant::now());
    }

    pub fn set_at(&mut self, key: impl Into<String>, value: V, ttl: Duration, now: Instant) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                data: value,
                written_at: now,
                ttl,
            },
        );
    }

    /// Value for `key` if present and unexpired. Expired entries are removed.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<&V> {
        if self.purge_if_expired(key, now) {
            self.hits += 1;
            self.entries.get(key).map(|entry| &entry.data)
        } else {
            self.misses += 1;
            None
        }
    }

    /// Same expiry check as [`TtlCache::get`] without returning the value
    pub fn has(&mut self, key: &str) -> bool {
        self.has_at(key, Instant::now())
    }

    pub fn has_at(&mut self, key: &str, now: Instant) -> bool {
        self.purge_if_expired(key, now)
    }

    pub fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Remove every entry whose key starts with `prefix`
    pub fn clear_by_prefix(&mut self, prefix: &str) {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - self.entries.len();
        if removed > 0 {
            log::debug!("Invalidated {} cache entries with prefix '{}'", removed, prefix);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, including ones that expired but were not looked up yet
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Log cache statistics
    pub fn log_stats(&self) {
        let total = self.hits + self.misses;
        if total > 0 {
            let hit_rate = (self.hits as f64 / total as f64) * 100.0;
            log::debug!(
                "Query cache: {} hits, {} misses ({:.1}% hit rate), {} entries",
                self.hits,
                self.misses,
                hit_rate,
                self.entries.len()
            );
        }
    }

    /// Returns true if a valid entry exists; drops it if it has expired
    fn purge_if_expired(&mut self, key: &str, now: Instant) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.is_valid(now) => true,
            Some(_) => {
                self.entries.remove(key);
                false
            }
            None => false,
        }
    }
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

//! Bounded LRU response cache with per-entry expiry
//!
//! Recency is tracked with a monotonically increasing access tick: each entry
//! remembers its last tick and a `BTreeMap` indexes entries by tick, so the
//! least-recently-used key is always the first entry of the index.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

use crate::metrics::record_cache_lookup;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    tick: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug)]
struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    recency: BTreeMap<u64, String>,
    next_tick: u64,
    hits: u64,
    misses: u64,
}

impl<V> CacheInner<V> {
    fn touch(&mut self, key: &str) {
        let tick = self.next_tick;
        self.next_tick += 1;
        if let Some(entry) = self.entries.get_mut(key) {
            self.recency.remove(&entry.tick);
            entry.tick = tick;
            self.recency.insert(tick, key.to_string());
        }
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.tick);
        Some(entry)
    }

    fn evict_lru(&mut self) -> Option<String> {
        let (_, key) = self.recency.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// Cache statistics for observability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries currently stored (expired entries not yet purged included)
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Hit percentage over all lookups (0 when none)
    pub hit_rate: f64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} entries, {} hits, {} misses ({:.1}% hit rate)",
            self.size, self.max_size, self.hits, self.misses, self.hit_rate
        )
    }
}

/// Thread-safe LRU cache with TTL expiry.
///
/// Entries are visible while `now <= expires_at`. A `get` on an expired entry
/// removes it and counts a miss. Inserting a new key into a full cache evicts
/// exactly one least-recently-used entry; updating an existing key never
/// evicts.
#[derive(Debug)]
pub struct ResponseCache<V> {
    inner: Mutex<CacheInner<V>>,
    capacity: usize,
}

impl<V: Clone> ResponseCache<V> {
    /// Create an empty cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(capacity.min(4096)),
                recency: BTreeMap::new(),
                next_tick: 0,
                hits: 0,
                misses: 0,
            }),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `key`, promoting it to most-recently-used on a hit.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();
        let now = Instant::now();

        let expired = match inner.entries.get(key) {
            None => {
                inner.misses += 1;
                record_cache_lookup(false);
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            inner.remove(key);
            inner.misses += 1;
            record_cache_lookup(false);
            trace!(key, "Cache entry expired");
            return None;
        }

        inner.touch(key);
        inner.hits += 1;
        record_cache_lookup(true);
        inner.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Store `value` under `key` for `ttl`.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        if self.capacity == 0 {
            return;
        }

        let key = key.into();
        let mut inner = self.lock();
        let expires_at = Instant::now() + ttl;

        if let Some(entry) = inner.entries.get_mut(&key) {
            entry.value = value;
            entry.expires_at = expires_at;
            inner.touch(&key);
            return;
        }

        if inner.entries.len() >= self.capacity {
            if let Some(evicted) = inner.evict_lru() {
                trace!(evicted = %evicted, "Evicted least recently used cache entry");
            }
        }

        let tick = inner.next_tick;
        inner.next_tick += 1;
        inner.recency.insert(tick, key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at,
                tick,
            },
        );
    }

    /// Drop every expired entry and return how many were removed.
    pub fn clear_expired(&self) -> usize {
        let mut inner = self.lock();
        let now = Instant::now();
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.remove(key);
        }
        expired.len()
    }

    /// Whether `key` is stored (expired or not) without touching recency.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of size and hit/miss counters
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let lookups = inner.hits + inner.misses;
        let hit_rate = if lookups > 0 {
            inner.hits as f64 / lookups as f64 * 100.0
        } else {
            0.0
        };
        CacheStats {
            size: inner.entries.len(),
            max_size: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
        }
    }
}

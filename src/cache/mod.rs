//! Bounded LRU response cache.
//!
//! [`BoundedCache`] memoizes the results of expensive operations (AI reply
//! generation) in a fixed number of slots. Recency is a total order over
//! inserts and hits, so exactly one entry is the eviction candidate at any
//! time: the least recently touched one.
//!
//! - `get` and "touch" are fused. A hit always moves the entry to the
//!   most-recently-used end.
//! - `put` on an existing key replaces the value and refreshes recency.
//!   `put` on a new key at capacity evicts the single LRU entry first.
//! - An optional TTL layers time-based expiry on top. When a new key
//!   arrives at capacity, expired entries are dropped first and a live
//!   entry is evicted only if none were expired.
//!
//! [`ReplyKey`] builds the deterministic cache keys used for AI replies.

mod key;

pub use key::ReplyKey;

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use tokio::time::Instant;

use crate::{HuginnError, Result};

/// Default maximum number of cached entries.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Configuration for a [`BoundedCache`].
///
/// ```rust
/// # use huginn::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(250)
///     .ttl(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 100.
    pub max_entries: usize,
    /// Optional time-to-live. Default: none (entries live until evicted).
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl: None,
        }
    }
}

impl CacheConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Expire entries older than `ttl`.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Point-in-time cache counters.
///
/// Counters are cumulative over the cache's lifetime; [`BoundedCache::clear`]
/// drops entries but keeps the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate in percent, or 0 when nothing has been looked up yet.
    pub fn hit_rate_percent(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct Inner<V> {
    entries: LruCache<String, Entry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Capacity-bounded key/value store with least-recently-used eviction.
///
/// Thread-safe: each operation is a single critical section behind a
/// mutex, so evict-then-insert and lookup-then-touch are atomic.
pub struct BoundedCache<V> {
    inner: Mutex<Inner<V>>,
    ttl: Option<Duration>,
}

impl<V: Clone> BoundedCache<V> {
    /// Create an empty cache.
    ///
    /// Fails with [`HuginnError::Configuration`] when `max_entries` is zero
    /// or the TTL is zero.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let capacity = NonZeroUsize::new(config.max_entries).ok_or_else(|| {
            HuginnError::Configuration("cache max_entries must be at least 1".to_string())
        })?;
        if config.ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(HuginnError::Configuration(
                "cache ttl must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            ttl: config.ttl,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &Entry<V>) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl)
    }

    /// Look up `key`, refreshing its recency on a hit.
    ///
    /// Returns `None` on a miss. An expired entry is removed and reported
    /// as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();
        let lookup = inner
            .entries
            .get(key)
            .map(|entry| (!self.is_expired(entry)).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => {
                inner.hits += 1;
                Some(value)
            }
            Some(None) => {
                inner.entries.pop(key);
                inner.misses += 1;
                None
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert or update `key`, making it the most recently used entry.
    ///
    /// Returns the key of the live entry evicted to make room, if any.
    /// Updating an existing key never evicts, and neither does a new key
    /// while expired entries can be dropped instead.
    pub fn put(&self, key: impl Into<String>, value: V) -> Option<String> {
        let key = key.into();
        let entry = Entry {
            value,
            inserted_at: Instant::now(),
        };

        let mut inner = self.lock();
        if !inner.entries.contains(&key) && inner.entries.len() == inner.entries.cap().get() {
            self.drop_expired(&mut inner);
        }
        match inner.entries.push(key.clone(), entry) {
            Some((old_key, _)) if old_key != key => {
                inner.evictions += 1;
                Some(old_key)
            }
            _ => None,
        }
    }

    /// Whether `key` is cached and live. Does not change recency.
    pub fn contains(&self, key: &str) -> bool {
        let inner = self.lock();
        inner
            .entries
            .peek(key)
            .is_some_and(|entry| !self.is_expired(entry))
    }

    /// Number of entries currently held (expired entries included until purged).
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.lock().entries.cap().get()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Remove every entry whose TTL has elapsed. Returns how many were removed.
    ///
    /// No-op when the cache has no TTL.
    pub fn purge_expired(&self) -> usize {
        let mut inner = self.lock();
        self.drop_expired(&mut inner)
    }

    fn drop_expired(&self, inner: &mut Inner<V>) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            inner.entries.pop(key);
        }
        expired.len()
    }

    /// Keys in eviction order: least recently used first.
    pub fn eviction_order(&self) -> Vec<String> {
        self.lock()
            .entries
            .iter()
            .rev()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.entries.len(),
            capacity: inner.entries.cap().get(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }
}

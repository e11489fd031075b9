//! Fixed-capacity memoization of trust scores.
//!
//! Eviction is strict FIFO on insertion order: a hit does not refresh an
//! entry. With the default capacity of 1 the cache remembers only the last
//! computed pair, which is exactly what a caller needs when it scores a
//! pair for an admission decision and then again for the edge weight.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::{Error, Result};

use super::TrustMetric;

/// Default number of cached pairs.
pub const DEFAULT_CAPACITY: usize = 1;

/// Bounded map evicting the oldest inserted key.
#[derive(Debug)]
pub struct FifoCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V: Clone> FifoCache<K, V> {
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig(
                "cache capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            entries: HashMap::with_capacity(capacity.min(1 << 16)),
            order: VecDeque::with_capacity(capacity.min(1 << 16)),
        })
    }

    /// Returns a copy of the cached value.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).cloned()
    }

    /// Inserts `value`, evicting the oldest key when full.
    ///
    /// Re-inserting a present key overwrites it in place and keeps its
    /// original position in the eviction order.
    pub fn insert(&mut self, key: K, value: V) {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return;
        }
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Hit/miss counters of a [`CachedTrustMetric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that ran the wrapped metric.
    pub misses: u64,
}

/// Wraps a metric with a [`FifoCache`] keyed by `(from, to)`.
pub struct CachedTrustMetric<M> {
    inner: M,
    cache: Mutex<FifoCache<(u64, u64), f64>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<M: TrustMetric> CachedTrustMetric<M> {
    /// Wraps `inner` with a cache of [`DEFAULT_CAPACITY`] entries.
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            cache: Mutex::new(FifoCache {
                capacity: DEFAULT_CAPACITY,
                entries: HashMap::with_capacity(DEFAULT_CAPACITY),
                order: VecDeque::with_capacity(DEFAULT_CAPACITY),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Wraps `inner` with a cache of `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `capacity` is zero.
    pub fn with_capacity(inner: M, capacity: usize) -> Result<Self> {
        Ok(Self {
            inner,
            cache: Mutex::new(FifoCache::new(capacity)?),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Returns the hit/miss counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Returns the wrapped metric.
    #[must_use]
    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: TrustMetric> TrustMetric for CachedTrustMetric<M> {
    fn trust(&self, from: u64, to: u64) -> Result<f64> {
        if let Some(value) = self.cache.lock().get(&(from, to)) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        // Computed outside the lock; a concurrent miss on the same pair
        // computes twice and the second insert overwrites in place.
        let value = self.inner.trust(from, to)?;
        self.cache.lock().insert((from, to), value);
        Ok(value)
    }
}

//! Bounded, caller-owned cache of per-frame values.
//!
//! Reading and resampling a frame is expensive, and interactive consumers
//! revisit the same frames. [`FrameCache`] memoises any per-frame value
//! (grids, detection results) keyed by [`FrameId`] and evicts the least
//! recently used entry once full. Values are stored behind [`Arc`] so a
//! cached grid can be handed out without copying its samples.
//!
//! The cache is an ordinary value: the caller creates it, sizes it and
//! decides who shares it (wrap it in a `Mutex` for cross-thread use).
//!
//! # Example
//!
//! ```rust
//! use iono_analysis::cache::FrameCache;
//! use iono_analysis::column::FrameId;
//!
//! let mut cache: FrameCache<Vec<f32>> = FrameCache::new(2);
//! cache.insert(FrameId::from("a"), vec![1.0]);
//! cache.insert(FrameId::from("b"), vec![2.0]);
//! cache.get(&FrameId::from("a"));
//! cache.insert(FrameId::from("c"), vec![3.0]); // evicts "b"
//!
//! assert!(cache.contains(&FrameId::from("a")));
//! assert!(!cache.contains(&FrameId::from("b")));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::column::FrameId;

/// Hit and miss counters of a [`FrameCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries dropped to make room.
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: Arc<V>,
    last_used: u64,
}

/// Least-recently-used cache keyed by frame identity.
#[derive(Debug)]
pub struct FrameCache<V> {
    entries: HashMap<FrameId, Entry<V>>,
    capacity: usize,
    clock: u64,
    stats: CacheStats,
}

impl<V> FrameCache<V> {
    /// Create a cache holding at most `capacity` entries. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            capacity,
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookup counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// True if `id` is cached. Does not count as a use.
    pub fn contains(&self, id: &FrameId) -> bool {
        self.entries.contains_key(id)
    }

    /// Cached value for `id`, marking it most recently used.
    pub fn get(&mut self, id: &FrameId) -> Option<Arc<V>> {
        self.clock += 1;
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.last_used = self.clock;
                self.stats.hits += 1;
                Some(Arc::clone(&entry.value))
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store `value` under `id`, evicting the least recently used entry if full.
    ///
    /// Returns the shared handle to the stored value.
    pub fn insert(&mut self, id: FrameId, value: V) -> Arc<V> {
        let value = Arc::new(value);
        if self.capacity == 0 {
            return value;
        }

        self.clock += 1;
        if !self.entries.contains_key(&id) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        self.entries.insert(
            id,
            Entry {
                value: Arc::clone(&value),
                last_used: self.clock,
            },
        );
        value
    }

    /// Cached value for `id`, or the result of `load` stored under `id`.
    ///
    /// Errors from `load` are returned and nothing is cached.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        id: &FrameId,
        load: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(value) = self.get(id) {
            return Ok(value);
        }
        let value = load()?;
        Ok(self.insert(id.clone(), value))
    }

    /// Drop the entry for `id`, returning its value.
    pub fn remove(&mut self, id: &FrameId) -> Option<Arc<V>> {
        self.entries.remove(id).map(|e| e.value)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_used)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            self.entries.remove(&id);
            self.stats.evictions += 1;
        }
    }
}

//! First-in, first-out cache store.
//!
//! Eviction follows first-insertion order only. Reads never reorder, and
//! overwriting an existing key keeps its original position.

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::clock::{Clock, SystemClock};
use crate::ledger::{CacheEntry, Ledger};
use crate::stats::CacheStats;
use crate::{CacheStore, EvictionPolicy};

/// FIFO cache store.
pub struct FifoCache<K, V> {
    max_size: usize,
    clock: Arc<dyn Clock>,
    inner: Mutex<Ledger<K, V>>,
}

impl<K, V> FifoCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Store holding at most `max_size` entries (0 = unbounded).
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self::with_clock(max_size, Arc::new(SystemClock::new()))
    }

    /// Store stamping entries with `clock`.
    #[must_use]
    pub fn with_clock(max_size: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_size,
            clock,
            inner: Mutex::new(Ledger::new()),
        }
    }

    /// Inspect an entry.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<CacheEntry<K, V>> {
        self.inner.lock().peek(key).cloned()
    }
}

impl<K, V> CacheStore<K, V> for FifoCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.inner.lock().read(key, now, false)
    }

    fn set(&self, key: K, value: V) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.write(key, value, now, false);
        let evicted = inner.enforce_bound(self.max_size);
        if evicted > 0 {
            trace!(policy = "fifo", evicted, size = inner.len(), "evicted entries");
        }
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn clear(&self) {
        self.inner.lock().clear();
    }

    fn contains(&self, key: &K) -> bool {
        self.inner.lock().peek(key).is_some()
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key).map(|e| e.value)
    }

    fn keys(&self) -> Vec<K> {
        self.inner.lock().keys()
    }

    fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    fn policy(&self) -> EvictionPolicy {
        EvictionPolicy::Fifo
    }

    fn max_size(&self) -> usize {
        self.max_size
    }
}

impl<K, V> std::fmt::Debug for FifoCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FifoCache")
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

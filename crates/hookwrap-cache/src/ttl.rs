//! Time-to-live cache store.
//!
//! Every entry records its insertion time. On any access, entries older than
//! `max_age` are physically removed before the operation runs, so an expired
//! entry is never observable. There is no background sweep.
//!
//! Overwriting a key restamps its insertion time and moves it to the back,
//! which keeps the eviction order identical to insertion-time order. That
//! ordering lets expiry stop at the first live entry, and makes `max_size`
//! a FIFO-style secondary bound.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use crate::clock::{Clock, SystemClock};
use crate::ledger::{CacheEntry, Ledger};
use crate::stats::CacheStats;
use crate::{CacheStore, EvictionPolicy};

/// TTL cache store.
pub struct TtlCache<K, V> {
    max_age: Duration,
    max_size: usize,
    clock: Arc<dyn Clock>,
    inner: Mutex<Ledger<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Store expiring entries older than `max_age` (zero = never), holding at
    /// most `max_size` entries (0 = unbounded).
    #[must_use]
    pub fn new(max_age: Duration, max_size: usize) -> Self {
        Self::with_clock(max_age, max_size, Arc::new(SystemClock::new()))
    }

    /// Store reading time from `clock`.
    #[must_use]
    pub fn with_clock(max_age: Duration, max_size: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_age,
            max_size,
            clock,
            inner: Mutex::new(Ledger::new()),
        }
    }

    /// Configured maximum entry age.
    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Inspect a live entry.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<CacheEntry<K, V>> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.expire(&mut inner, now);
        inner.peek(key).cloned()
    }

    fn expire(&self, ledger: &mut Ledger<K, V>, now: Duration) {
        if self.max_age.is_zero() {
            return;
        }
        let max_age = self.max_age;
        let purged = ledger.purge_front_while(|e| now.saturating_sub(e.inserted_at) > max_age);
        if purged > 0 {
            trace!(policy = "ttl", purged, size = ledger.len(), "expired entries");
        }
    }
}

impl<K, V> CacheStore<K, V> for TtlCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.expire(&mut inner, now);
        inner.read(key, now, false)
    }

    fn set(&self, key: K, value: V) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.expire(&mut inner, now);
        inner.write(key, value, now, true);
        let evicted = inner.enforce_bound(self.max_size);
        if evicted > 0 {
            trace!(policy = "ttl", evicted, size = inner.len(), "evicted entries");
        }
    }

    fn len(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.expire(&mut inner, now);
        inner.len()
    }

    fn clear(&self) {
        self.inner.lock().clear();
    }

    fn contains(&self, key: &K) -> bool {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.expire(&mut inner, now);
        inner.peek(key).is_some()
    }

    fn remove(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.expire(&mut inner, now);
        inner.remove(key).map(|e| e.value)
    }

    fn keys(&self) -> Vec<K> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.expire(&mut inner, now);
        inner.keys()
    }

    fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    fn policy(&self) -> EvictionPolicy {
        EvictionPolicy::Ttl
    }

    fn max_size(&self) -> usize {
        self.max_size
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("max_age", &self.max_age)
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

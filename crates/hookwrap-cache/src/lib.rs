//! # hookwrap-cache
//!
//! Bounded cache stores backing the memoize hook.
//!
//! Three eviction policies share one [`CacheStore`] contract:
//!
//! - [`LruCache`]: reads and writes refresh recency; the least recently used
//!   entry is evicted first.
//! - [`FifoCache`]: eviction strictly follows first-insertion order; access
//!   never perturbs it.
//! - [`TtlCache`]: entries older than `max_age` read as absent and are purged
//!   lazily on access; an optional `max_size` acts as a FIFO-style bound.
//!
//! A `max_size` of 0 means unbounded; a `max_age` of zero means entries
//! never expire.
//!
//! ## Concurrency
//!
//! Each store keeps its state behind one `parking_lot::Mutex`, so a `set`
//! and the evictions it triggers happen in one critical section and
//! `len() <= max_size` holds under concurrent writers.

#![deny(unsafe_code)]

pub mod clock;
pub mod fifo;
mod ledger;
pub mod lru;
pub mod stats;
pub mod ttl;

use std::fmt;
use std::hash::Hash;
use std::time::Duration;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fifo::FifoCache;
pub use ledger::CacheEntry;
pub use lru::LruCache;
pub use stats::CacheStats;
pub use ttl::TtlCache;

/// Which eviction rule a store applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictionPolicy {
    /// Least recently used.
    Lru,
    /// First in, first out.
    Fifo,
    /// Time to live, with optional FIFO size bound.
    Ttl,
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lru => write!(f, "lru"),
            Self::Fifo => write!(f, "fifo"),
            Self::Ttl => write!(f, "ttl"),
        }
    }
}

/// Mapping interface shared by every eviction policy.
///
/// All methods take `&self`; implementations serialize access internally.
pub trait CacheStore<K, V>: Send + Sync {
    /// Look up `key`. Counts as an access for LRU and TTL purposes.
    fn get(&self, key: &K) -> Option<V>;

    /// Insert or overwrite `key`, evicting as the policy requires.
    fn set(&self, key: K, value: V);

    /// Number of live entries.
    fn len(&self) -> usize;

    /// Whether the store holds no live entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry and reset statistics.
    fn clear(&self);

    /// Whether `key` is present and live. Does not refresh LRU recency.
    fn contains(&self, key: &K) -> bool;

    /// Remove `key`, returning its value if it was live.
    fn remove(&self, key: &K) -> Option<V>;

    /// Live keys in eviction order, next victim first.
    fn keys(&self) -> Vec<K>;

    /// Current counters.
    fn stats(&self) -> CacheStats;

    /// The store's eviction rule.
    fn policy(&self) -> EvictionPolicy;

    /// Configured size bound (0 = unbounded).
    fn max_size(&self) -> usize;
}

/// LRU store holding at most `max_size` entries (0 = unbounded).
pub fn lru_cache<K, V>(max_size: usize) -> LruCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    LruCache::new(max_size)
}

/// FIFO store holding at most `max_size` entries (0 = unbounded).
pub fn fifo_cache<K, V>(max_size: usize) -> FifoCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    FifoCache::new(max_size)
}

/// TTL store expiring entries older than `max_age`, optionally size-bounded.
pub fn ttl_cache<K, V>(max_age: Duration, max_size: Option<usize>) -> TtlCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    TtlCache::new(max_age, max_size.unwrap_or(0))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

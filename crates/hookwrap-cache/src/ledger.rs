//! Ordered entry storage shared by every eviction policy.
//!
//! Entries live in a hash map for lookup; a sequence-number index keeps them
//! in eviction order (front = next to evict). Moving an entry to the back
//! assigns it a fresh sequence number, so ordering ties cannot occur.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::Duration;

use crate::stats::CacheStats;

/// One cached value with its bookkeeping timestamps.
#[derive(Clone, Debug)]
pub struct CacheEntry<K, V> {
    /// Entry key.
    pub key: K,
    /// Cached value.
    pub value: V,
    /// When the entry was (last) inserted.
    pub inserted_at: Duration,
    /// When the entry was last read or written.
    pub last_access: Duration,
    seq: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

pub(crate) struct Ledger<K, V> {
    entries: HashMap<K, CacheEntry<K, V>>,
    order: BTreeMap<u64, K>,
    next_seq: u64,
    counters: Counters,
}

impl<K, V> Ledger<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            counters: Counters::default(),
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn peek(&self, key: &K) -> Option<&CacheEntry<K, V>> {
        self.entries.get(key)
    }

    /// Read a value, stamping `last_access`. `refresh` also moves it to the back.
    pub(crate) fn read(&mut self, key: &K, now: Duration, refresh: bool) -> Option<V> {
        if refresh {
            self.move_to_back(key);
        }
        let Some(entry) = self.entries.get_mut(key) else {
            self.counters.misses += 1;
            return None;
        };
        entry.last_access = now;
        self.counters.hits += 1;
        Some(entry.value.clone())
    }

    /// Record a miss that the caller resolved without a lookup (e.g. expiry).
    pub(crate) fn record_miss(&mut self) {
        self.counters.misses += 1;
    }

    /// Insert or overwrite. `reposition` moves an existing key to the back
    /// and restamps `inserted_at`; otherwise it keeps its place and age.
    pub(crate) fn write(&mut self, key: K, value: V, now: Duration, reposition: bool) {
        if self.entries.contains_key(&key) {
            if reposition {
                self.move_to_back(&key);
            }
            if let Some(entry) = self.entries.get_mut(&key) {
                entry.value = value;
                entry.last_access = now;
                if reposition {
                    entry.inserted_at = now;
                }
            }
            return;
        }

        let seq = self.bump_seq();
        let _ = self.order.insert(seq, key.clone());
        let _ = self.entries.insert(
            key.clone(),
            CacheEntry {
                key,
                value,
                inserted_at: now,
                last_access: now,
                seq,
            },
        );
    }

    fn move_to_back(&mut self, key: &K) {
        let seq = self.bump_seq();
        if let Some(entry) = self.entries.get_mut(key) {
            let _ = self.order.remove(&entry.seq);
            entry.seq = seq;
            let _ = self.order.insert(seq, key.clone());
        }
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<CacheEntry<K, V>> {
        let entry = self.entries.remove(key)?;
        let _ = self.order.remove(&entry.seq);
        Some(entry)
    }

    pub(crate) fn front(&self) -> Option<&CacheEntry<K, V>> {
        self.order
            .first_key_value()
            .and_then(|(_, key)| self.entries.get(key))
    }

    fn pop_front(&mut self) -> Option<CacheEntry<K, V>> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key)
    }

    /// Evict from the front until at most `max_size` entries remain.
    /// `max_size == 0` means unbounded. Returns how many were evicted.
    pub(crate) fn enforce_bound(&mut self, max_size: usize) -> usize {
        if max_size == 0 {
            return 0;
        }
        let mut evicted = 0;
        while self.entries.len() > max_size {
            if self.pop_front().is_none() {
                break;
            }
            evicted += 1;
        }
        self.counters.evictions += evicted as u64;
        evicted
    }

    /// Drop entries from the front while `expired` holds. Only valid when
    /// front-to-back order is also oldest-to-newest insertion order.
    pub(crate) fn purge_front_while(&mut self, expired: impl Fn(&CacheEntry<K, V>) -> bool) -> usize {
        let mut purged = 0;
        while self.front().is_some_and(&expired) {
            let _ = self.pop_front();
            purged += 1;
        }
        self.counters.expirations += purged as u64;
        purged
    }

    /// Keys in eviction order, front first.
    pub(crate) fn keys(&self) -> Vec<K> {
        self.order.values().cloned().collect()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.counters = Counters::default();
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats::new(
            self.entries.len(),
            self.counters.hits,
            self.counters.misses,
            self.counters.evictions,
            self.counters.expirations,
        )
    }
}

//! Cache statistics.

use std::fmt;

/// Point-in-time counters for one cache store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheStats {
    /// Number of live entries.
    pub size: usize,
    /// Lookups that found a live entry.
    pub hits: u64,
    /// Lookups that found nothing (or only an expired entry).
    pub misses: u64,
    /// Entries dropped to honor `max_size`.
    pub evictions: u64,
    /// Entries dropped because they outlived `max_age`.
    pub expirations: u64,
    /// `hits / (hits + misses)`, or 0.0 before any lookup.
    pub hit_rate: f64,
}

impl CacheStats {
    pub(crate) fn new(size: usize, hits: u64, misses: u64, evictions: u64, expirations: u64) -> Self {
        let total = hits + misses;
        Self {
            size,
            hits,
            misses,
            evictions,
            expirations,
            #[allow(clippy::cast_precision_loss)]
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "size={} hits={} misses={} evictions={} expirations={} hit_rate={:.2}",
            self.size, self.hits, self.misses, self.evictions, self.expirations, self.hit_rate
        )
    }
}

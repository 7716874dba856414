use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Defaults for the store `memoize` builds when none is supplied.
///
/// With `max_age_secs == 0` the default store is LRU bounded by `max_size`;
/// otherwise it is a TTL store. `max_size == 0` means unbounded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Maximum entries held by the default store (0 = unbounded).
    pub max_size: usize,
    /// Entry lifetime in seconds for the default store (0 = forever).
    pub max_age_secs: u64,
}

impl CacheSettings {
    /// `max_age_secs` as a [`Duration`].
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    /// Whether entries of the default store expire.
    pub fn expires(&self) -> bool {
        self.max_age_secs > 0
    }
}

use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// In-memory key-value store where every entry shares one fixed lifetime.
///
/// Expiry is lazy: an expired entry is removed by the `get` that observes it,
/// there is no background sweep. There is also no capacity bound; the store
/// grows with the number of distinct keys, which is a known limitation and
/// acceptable for the handful of network-info keys this process caches.
///
/// The cache does not lock internally. The serving process wraps it in a
/// `tokio::sync::Mutex` and accepts that two requests may both miss and both
/// fetch; entries are idempotent snapshots of external state, so last write
/// wins.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: HashMap<String, Entry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Returns the value for `key`, or `None` if it was never set or its
    /// lifetime has elapsed. An expired entry is removed before returning.
    pub fn get(&mut self, key: &str) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if Instant::now() > entry.expires_at => {
                self.entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Inserts or replaces the entry for `key`, stamping expiry as `now + ttl`.
    /// Any previous entry and its expiry are discarded even if not yet expired.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

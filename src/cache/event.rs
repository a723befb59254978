//! Cache Events
//!
//! Notifications emitted when an entry leaves the cache.

use std::fmt;

// == Cache Event ==
/// Why an entry left the cache.
///
/// Every departure emits `Removed`. Expiry and eviction additionally emit
/// `Expired` or `Evicted` right after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheEvent {
    /// The entry outlived its `max_age` or `max_idle` and was dropped on access
    Expired,
    /// The entry was detached from the cache
    Removed,
    /// The entry was the least recently used one when a bound was exceeded
    Evicted,
}

impl CacheEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheEvent::Expired => "expired",
            CacheEvent::Removed => "removed",
            CacheEvent::Evicted => "evicted",
        }
    }
}

impl fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered event observer, called with `(event, value, key)`.
pub type Listener<K, V> = Box<dyn FnMut(CacheEvent, &V, &K) + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(CacheEvent::Expired.to_string(), "expired");
        assert_eq!(CacheEvent::Removed.to_string(), "removed");
        assert_eq!(CacheEvent::Evicted.as_str(), "evicted");
    }
}

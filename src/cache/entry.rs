//! Cache Entry Module
//!
//! Defines the per-key record: the value, its timestamps, its TTL, its cached
//! size, and the two key links that thread it into the recency list.

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// All timestamps and durations are in milliseconds.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    /// The stored value
    pub value: V,
    /// When the value was last replaced; starts the absolute TTL clock
    pub added: u64,
    /// When the entry was last written or read; drives idle timeout
    pub updated: u64,
    /// Per-entry TTL, None = never expires on age
    pub max_age: Option<u64>,
    /// Cached `added + max_age`
    pub expiration: Option<u64>,
    /// Lazily computed size, None = not yet estimated
    pub size: Option<u64>,
    /// Next less recently used key
    pub(crate) older: Option<K>,
    /// Next more recently used key
    pub(crate) newer: Option<K>,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates an unlinked entry stamped at `now`.
    pub fn new(value: V, now: u64) -> Self {
        Self {
            value,
            added: now,
            updated: now,
            max_age: None,
            expiration: None,
            size: None,
            older: None,
            newer: None,
        }
    }

    // == Set Max Age ==
    /// Sets or clears the per-entry TTL, keeping `expiration == added + max_age`.
    pub fn set_max_age(&mut self, max_age: Option<u64>) {
        self.max_age = max_age;
        self.expiration = max_age.map(|age| self.added.saturating_add(age));
    }

    // == Is Expired ==
    /// Checks whether the entry is dead at `now`.
    ///
    /// Boundary condition: an entry is expired once `now` reaches its
    /// expiration (or its idle deadline), not only after passing it.
    ///
    /// `max_idle` is the cache-global idle window; 0 disables it.
    pub fn is_expired(&self, now: u64, max_idle: u64) -> bool {
        let aged_out = matches!(self.expiration, Some(expires) if expires <= now);
        let idled_out = max_idle > 0 && self.updated.saturating_add(max_idle) <= now;
        aged_out || idled_out
    }
}

//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with the intrusive recency
//! index, absolute TTL, idle timeout and size-bounded eviction.
//!
//! Expiry is lazy: an entry is only checked when something would observe it,
//! and every such reader goes through `Cache::resolve_entry`. There is no
//! timer; the optional sweep task just resolves every key.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use deepsize::DeepSizeOf;
use tracing::debug;

use crate::cache::{
    CacheEntry, CacheEvent, CacheStats, Clock, DeepSize, Listener, RecencyIndex, SizeEstimator,
    SystemClock,
};
use crate::config::Config;
use crate::duration::parse_duration;
use crate::error::Result;

// == Cache ==
/// In-memory cache with four composable policies.
///
/// - `max_length`: LRU eviction once the entry count exceeds it
/// - `max_age`: default absolute TTL, overridable per entry
/// - `max_idle`: expiry once an entry has not been touched for this long
/// - `max_size`: LRU eviction once the estimated total size exceeds it
///
/// A zero bound disables its policy. All durations are kept in milliseconds.
///
/// While `max_size` is set every entry carries its estimated size, so pruning
/// after an insert never has to call the estimator.
pub struct Cache<K, V> {
    /// Key-value storage; entries carry their own recency links
    map: HashMap<K, CacheEntry<K, V>>,
    /// Ends of the recency list
    index: RecencyIndex<K>,
    max_length: usize,
    max_age: u64,
    max_idle: u64,
    max_size: u64,
    estimator: Box<dyn SizeEstimator<K, V>>,
    clock: Arc<dyn Clock>,
    listeners: Vec<Listener<K, V>>,
    stats: CacheStats,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + DeepSizeOf,
    V: Clone + DeepSizeOf,
{
    // == Constructor ==
    /// Creates an unbounded cache on the system clock, sized by [`DeepSize`].
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an unbounded cache reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_clock_and_estimator(clock, DeepSize)
    }

    /// Creates a cache with the bounds from `config`.
    pub fn from_config(config: &Config) -> Self {
        let mut cache = Self::new();
        cache.max_length = config.max_length;
        cache.max_age = millis(config.max_age);
        cache.max_idle = millis(config.max_idle);
        cache.max_size = config.max_size;
        cache
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Cache<K, V> {
    /// Creates an unbounded cache for types the default estimator cannot size.
    pub fn with_clock_and_estimator(
        clock: Arc<dyn Clock>,
        estimator: impl SizeEstimator<K, V> + 'static,
    ) -> Self {
        Self {
            map: HashMap::new(),
            index: RecencyIndex::new(),
            max_length: 0,
            max_age: 0,
            max_idle: 0,
            max_size: 0,
            estimator: Box::new(estimator),
            clock,
            listeners: Vec::new(),
            stats: CacheStats::new(),
        }
    }

    /// Replaces the size estimator.
    pub fn with_size_estimator(mut self, estimator: impl SizeEstimator<K, V> + 'static) -> Self {
        self.estimator = Box::new(estimator);
        self
    }

    // == Listeners ==
    /// Registers an observer for `Expired`, `Removed` and `Evicted` events.
    pub fn on_event<F>(&mut self, listener: F)
    where
        F: FnMut(CacheEvent, &V, &K) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, event: CacheEvent, value: &V, key: &K) {
        for listener in self.listeners.iter_mut() {
            listener(event, value, key);
        }
    }

    // == Set ==
    /// Stores a value, restarting its TTL clock.
    ///
    /// The entry gets the cache-wide `max_age`, if any. Inserting a new key may
    /// evict the least recently used entries to honour `max_length` and
    /// `max_size`.
    ///
    /// Only fails if the size estimator fails on the new value. The estimate is
    /// taken before anything changes, so a failed `set` leaves the cache as it
    /// was.
    pub fn set(&mut self, key: K, value: V) -> Result<()> {
        self.insert(key, value, None)
    }

    /// Stores a value with its own absolute TTL.
    pub fn set_with_max_age(&mut self, key: K, value: V, max_age: Duration) -> Result<()> {
        self.insert(key, value, Some(millis(max_age)))
    }

    fn insert(&mut self, key: K, value: V, max_age: Option<u64>) -> Result<()> {
        let now = self.clock.now_ms();
        let size = if self.max_size > 0 {
            Some(self.estimator.estimate(&value, &key)?)
        } else {
            None
        };
        let max_age = max_age
            .filter(|age| *age > 0)
            .or((self.max_age > 0).then_some(self.max_age));

        let is_new = match self.map.get_mut(&key) {
            Some(entry) => {
                entry.value = value;
                entry.added = now;
                entry.updated = now;
                entry.size = size;
                entry.set_max_age(max_age);
                false
            }
            None => {
                let mut entry = CacheEntry::new(value, now);
                entry.size = size;
                entry.set_max_age(max_age);
                self.map.insert(key.clone(), entry);
                true
            }
        };

        if is_new {
            self.index.link_as_newest(&mut self.map, &key);

            while self.max_length > 0 && self.map.len() > self.max_length {
                if self.evict().is_none() {
                    break;
                }
            }
            // Every other entry is already sized, so this cannot reach the estimator
            self.prune(true)?;
        } else {
            self.index.move_to_newest(&mut self.map, &key);
        }

        self.stats.set_total_entries(self.map.len());
        Ok(())
    }

    // == Get ==
    /// Retrieves a value and marks it most recently used.
    ///
    /// Refreshes the idle timer but not the absolute TTL. Expired entries are
    /// dropped and count as misses.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(key) = self.stored_key(key) else {
            self.stats.record_miss();
            return None;
        };

        let now = self.clock.now_ms();
        let value = match self.resolve_entry(&key, now) {
            Some(entry) => {
                entry.updated = now;
                entry.value.clone()
            }
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        self.index.move_to_newest(&mut self.map, &key);
        self.stats.record_hit();
        Some(value)
    }

    // == Peek ==
    /// Retrieves a value without touching its recency or idle timer.
    pub fn peek<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let key = self.stored_key(key)?;
        let now = self.clock.now_ms();
        self.resolve_entry(&key, now).map(|entry| entry.value.clone())
    }

    // == Has ==
    /// Checks whether a live entry exists. May drop it if it has expired.
    pub fn has<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.stored_key(key) {
            Some(key) => {
                let now = self.clock.now_ms();
                self.resolve_entry(&key, now).is_some()
            }
            None => false,
        }
    }

    // == Remove ==
    /// Removes an entry, returning its value. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let key = self.stored_key(key)?;
        self.remove_entry(&key).map(|entry| entry.value)
    }

    // == Evict ==
    /// Removes the least recently used entry. No-op on an empty cache.
    pub fn evict(&mut self) -> Option<(K, V)> {
        self.evict_entry().map(|(key, entry)| (key, entry.value))
    }

    fn evict_entry(&mut self) -> Option<(K, CacheEntry<K, V>)> {
        let key = self.index.oldest()?.clone();
        let entry = self.remove_entry(&key)?;
        self.stats.record_eviction();
        debug!(remaining = self.map.len(), "Evicted least recently used entry");
        self.notify(CacheEvent::Evicted, &entry.value, &key);
        Some((key, entry))
    }

    // == Prune ==
    /// Evicts least recently used entries until the total size fits `max_size`.
    ///
    /// Does nothing unless `check_size` is set and a size bound is configured.
    /// Returns the number of entries evicted.
    pub fn prune(&mut self, check_size: bool) -> Result<usize> {
        if !check_size || self.max_size == 0 {
            return Ok(0);
        }

        let mut total = self.total_size()?;
        let mut evicted = 0;
        while total > self.max_size {
            match self.evict_entry() {
                Some((_, entry)) => {
                    total = total.saturating_sub(entry.size.unwrap_or(0));
                    evicted += 1;
                }
                None => break,
            }
        }

        if evicted > 0 {
            debug!(evicted, total, max_size = self.max_size, "Pruned cache to size bound");
        }
        Ok(evicted)
    }

    // == Prune Expired ==
    /// Resolves every entry, dropping the expired ones.
    ///
    /// Returns the number of entries dropped.
    pub fn prune_expired(&mut self) -> usize {
        let before = self.map.len();
        self.keys();
        before - self.map.len()
    }

    // == Clear ==
    /// Removes every entry, oldest first.
    pub fn clear(&mut self) {
        while let Some(key) = self.index.oldest().cloned() {
            self.remove_entry(&key);
        }
    }

    // == Views ==
    /// Live keys from most to least recently used.
    ///
    /// The recency list is snapshotted before any entry is resolved, so
    /// expiries during the walk cannot disturb it.
    pub fn keys(&mut self) -> Vec<K> {
        let now = self.clock.now_ms();
        let mut keys = self.index.keys_newest_first(&self.map);
        keys.retain(|key| self.resolve_entry(key, now).is_some());
        keys
    }

    /// Live values, in the same order as [`Cache::keys`].
    pub fn values(&mut self) -> Vec<V> {
        let keys = self.keys();
        keys.iter()
            .filter_map(|key| self.map.get(key).map(|entry| entry.value.clone()))
            .collect()
    }

    /// Total estimated size of the live entries.
    ///
    /// Sizes not computed yet are estimated and cached.
    pub fn total_size(&mut self) -> Result<u64> {
        let mut total = 0u64;
        for key in self.keys() {
            let Some(entry) = self.map.get_mut(&key) else {
                continue;
            };
            let size = match entry.size {
                Some(size) => size,
                None => {
                    let size = self.estimator.estimate(&entry.value, &key)?;
                    entry.size = Some(size);
                    size
                }
            };
            total = total.saturating_add(size);
        }
        Ok(total)
    }

    /// Calls `f` for each live entry, most recently used first.
    ///
    /// The key list is taken once up front, so `f` may freely mutate the cache.
    /// Entries that disappear or expire before their turn are skipped.
    /// Visiting does not change recency.
    pub fn for_each<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Self, V, &K),
    {
        for key in self.keys() {
            let now = self.clock.now_ms();
            let value = match self.resolve_entry(&key, now) {
                Some(entry) => entry.value.clone(),
                None => continue,
            };
            f(self, value, &key);
        }
    }

    /// Number of entries, including expired ones not yet observed.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.map.len());
        stats
    }

    // == Configuration ==
    /// Entry-count bound, 0 = unbounded.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Sets the entry-count bound, evicting down to it if it shrank.
    pub fn set_max_length(&mut self, max_length: usize) {
        self.max_length = max_length;
        if max_length == 0 {
            return;
        }
        while self.map.len() > max_length {
            if self.evict().is_none() {
                break;
            }
        }
    }

    /// Default absolute TTL for new entries.
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age)
    }

    /// Sets the default TTL and applies it to existing entries.
    ///
    /// An entry that already has a shorter TTL keeps it, so this can only
    /// tighten expiry, never loosen it.
    pub fn set_max_age(&mut self, max_age: Duration) {
        let max_age = millis(max_age);
        self.max_age = max_age;
        if max_age == 0 {
            return;
        }
        for entry in self.map.values_mut() {
            if matches!(entry.max_age, Some(own) if own < max_age) {
                continue;
            }
            entry.set_max_age(Some(max_age));
        }
    }

    /// [`Cache::set_max_age`] from a human duration like `"3 seconds"`.
    pub fn set_max_age_str(&mut self, max_age: &str) -> Result<()> {
        self.set_max_age(parse_duration(max_age)?);
        Ok(())
    }

    /// Idle timeout shared by all entries.
    pub fn max_idle(&self) -> Duration {
        Duration::from_millis(self.max_idle)
    }

    /// Sets the idle timeout. Takes effect at the next access of each entry.
    pub fn set_max_idle(&mut self, max_idle: Duration) {
        self.max_idle = millis(max_idle);
    }

    /// [`Cache::set_max_idle`] from a human duration like `"30s"`.
    pub fn set_max_idle_str(&mut self, max_idle: &str) -> Result<()> {
        self.set_max_idle(parse_duration(max_idle)?);
        Ok(())
    }

    /// Total-size bound, 0 = unbounded.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Sets the total-size bound and prunes down to it.
    ///
    /// Every entry is sized before the bound changes. If the estimator fails
    /// the previous bound stays in force and nothing is evicted.
    pub fn set_max_size(&mut self, max_size: u64) -> Result<()> {
        if max_size > 0 {
            self.size_unsized_entries()?;
        }
        self.max_size = max_size;
        self.prune(true)?;
        Ok(())
    }

    // == Internals ==
    /// Estimates every entry whose size is not cached yet.
    fn size_unsized_entries(&mut self) -> Result<()> {
        for (key, entry) in self.map.iter_mut() {
            if entry.size.is_none() {
                entry.size = Some(self.estimator.estimate(&entry.value, key)?);
            }
        }
        Ok(())
    }

    fn stored_key<Q>(&self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get_key_value(key).map(|(stored, _)| stored.clone())
    }

    /// The single choke point for readers: returns the entry if it is live,
    /// otherwise drops it and emits `Expired`.
    fn resolve_entry(&mut self, key: &K, now: u64) -> Option<&mut CacheEntry<K, V>> {
        let expired = self.map.get(key)?.is_expired(now, self.max_idle);
        if expired {
            if let Some(entry) = self.remove_entry(key) {
                self.stats.record_expiration();
                debug!(remaining = self.map.len(), "Dropped expired entry");
                self.notify(CacheEvent::Expired, &entry.value, key);
            }
            return None;
        }
        self.map.get_mut(key)
    }

    /// Detaches an entry from the map and the recency list and emits `Removed`.
    fn remove_entry(&mut self, key: &K) -> Option<CacheEntry<K, V>> {
        if !self.map.contains_key(key) {
            return None;
        }
        self.index.unlink(&mut self.map, key);
        let entry = self.map.remove(key)?;
        self.stats.record_removal();
        self.stats.set_total_entries(self.map.len());
        self.notify(CacheEvent::Removed, &entry.value, key);
        Some(entry)
    }

    // == Invariants ==
    /// Checks the structural invariants: map and recency list in bijection,
    /// mirrored links, cached expirations in sync, sizes present while
    /// `max_size` is set, and the count bound.
    pub fn validate_invariants(&self) -> std::result::Result<(), String> {
        self.index.validate(&self.map)?;

        for entry in self.map.values() {
            let expected = entry.max_age.map(|age| entry.added.saturating_add(age));
            if entry.expiration != expected {
                return Err("entry expiration out of sync with max_age".to_string());
            }
        }

        if self.max_size > 0 && self.map.values().any(|entry| entry.size.is_none()) {
            return Err("unsized entry while max_size is set".to_string());
        }

        if self.max_length > 0 && self.map.len() > self.max_length {
            return Err(format!(
                "{} entries exceed max_length {}",
                self.map.len(),
                self.max_length
            ));
        }

        Ok(())
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Hash + Eq + Clone + DeepSizeOf,
    V: Clone + DeepSizeOf,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("len", &self.map.len())
            .field("max_length", &self.max_length)
            .field("max_age", &self.max_age)
            .field("max_idle", &self.max_idle)
            .field("max_size", &self.max_size)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

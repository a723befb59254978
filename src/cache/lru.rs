//! Recency Index Module
//!
//! Intrusive doubly linked list of keys, threaded through the `older` /
//! `newer` links of the entries stored in the cache map.
//!
//! Links are keys, not pointers: every hop is re-resolved through the map.
//! `None` is the "no neighbour" sentinel and can never collide with a key.
//!
//! ```text
//!   newest ─► [c] ──older──► [b] ──older──► [a] ◄─ oldest
//!             [c] ◄──newer── [b] ◄──newer── [a]
//! ```
//!
//! All operations are O(1) apart from the snapshot walk.

use std::collections::HashMap;
use std::hash::Hash;

use crate::cache::CacheEntry;

// == Recency Index ==
/// The two ends of the recency list. The links themselves live in the entries.
#[derive(Debug)]
pub struct RecencyIndex<K> {
    /// Most recently used key
    newest: Option<K>,
    /// Least recently used key, next eviction candidate
    oldest: Option<K>,
}

impl<K> Default for RecencyIndex<K> {
    fn default() -> Self {
        Self {
            newest: None,
            oldest: None,
        }
    }
}

impl<K: Hash + Eq + Clone> RecencyIndex<K> {
    // == Constructor ==
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently used key.
    #[cfg(test)]
    pub(crate) fn newest(&self) -> Option<&K> {
        self.newest.as_ref()
    }

    /// Least recently used key.
    pub fn oldest(&self) -> Option<&K> {
        self.oldest.as_ref()
    }

    // == Link As Newest ==
    /// Attaches an unlinked entry at the head of the list.
    ///
    /// The entry for `key` must already be in `map`.
    pub fn link_as_newest<V>(&mut self, map: &mut HashMap<K, CacheEntry<K, V>>, key: &K) {
        let previous = self.newest.replace(key.clone());

        match &previous {
            Some(head) => match map.get_mut(head) {
                Some(entry) => entry.newer = Some(key.clone()),
                None => debug_assert!(false, "dangling newest link"),
            },
            None => self.oldest = Some(key.clone()),
        }

        match map.get_mut(key) {
            Some(entry) => {
                entry.older = previous;
                entry.newer = None;
            }
            None => debug_assert!(false, "linking a key that is not in the map"),
        }
    }

    // == Unlink ==
    /// Splices an entry out of the list, reconnecting its neighbours.
    ///
    /// The entry stays in `map`; only its links are cleared.
    pub fn unlink<V>(&mut self, map: &mut HashMap<K, CacheEntry<K, V>>, key: &K) {
        let (older, newer) = match map.get_mut(key) {
            Some(entry) => (entry.older.take(), entry.newer.take()),
            None => {
                debug_assert!(false, "unlinking a key that is not in the map");
                return;
            }
        };

        match &older {
            Some(o) => match map.get_mut(o) {
                Some(entry) => entry.newer = newer.clone(),
                None => debug_assert!(false, "dangling older link"),
            },
            None => self.oldest = newer.clone(),
        }

        match &newer {
            Some(n) => match map.get_mut(n) {
                Some(entry) => entry.older = older,
                None => debug_assert!(false, "dangling newer link"),
            },
            None => self.newest = older,
        }
    }

    // == Move To Newest ==
    /// Marks a key as most recently used.
    ///
    /// No-op if it already is, which also covers the single-element list.
    pub fn move_to_newest<V>(&mut self, map: &mut HashMap<K, CacheEntry<K, V>>, key: &K) {
        if self.newest.as_ref() == Some(key) {
            return;
        }
        self.unlink(map, key);
        self.link_as_newest(map, key);
    }

    // == Snapshot ==
    /// Collects keys from newest to oldest.
    ///
    /// The walk is bounded by `map.len()` so a corrupted list cannot loop.
    pub fn keys_newest_first<V>(&self, map: &HashMap<K, CacheEntry<K, V>>) -> Vec<K> {
        let mut keys = Vec::with_capacity(map.len());
        let mut cursor = self.newest.as_ref();

        while let Some(key) = cursor {
            if keys.len() >= map.len() {
                debug_assert!(false, "recency list is longer than the map");
                break;
            }
            keys.push(key.clone());
            cursor = map.get(key).and_then(|entry| entry.older.as_ref());
        }

        keys
    }

    // == Validate ==
    /// Checks that the list and the map are in bijection and that the
    /// backward walk mirrors the forward walk.
    pub fn validate<V>(&self, map: &HashMap<K, CacheEntry<K, V>>) -> Result<(), String> {
        let forward = self.keys_newest_first(map);
        if forward.len() != map.len() {
            return Err(format!(
                "forward walk visited {} keys but map holds {}",
                forward.len(),
                map.len()
            ));
        }

        let mut backward = Vec::with_capacity(map.len());
        let mut cursor = self.oldest.as_ref();
        while let Some(key) = cursor {
            if backward.len() >= map.len() {
                return Err("backward walk is longer than the map".to_string());
            }
            backward.push(key.clone());
            cursor = map.get(key).and_then(|entry| entry.newer.as_ref());
        }
        backward.reverse();

        if forward != backward {
            return Err("backward walk does not mirror forward walk".to_string());
        }

        let mut seen = std::collections::HashSet::with_capacity(forward.len());
        if !forward.iter().all(|key| seen.insert(key)) {
            return Err("a key appears twice in the recency list".to_string());
        }

        Ok(())
    }
}

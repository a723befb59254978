//! Cache Module
//!
//! Provides the in-memory cache with LRU eviction, absolute TTL, idle timeout
//! and size-bounded eviction.

mod clock;
mod entry;
mod event;
mod lru;
mod size;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::Mutex;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use event::{CacheEvent, Listener};
pub use lru::RecencyIndex;
pub use size::{DeepSize, JsonSize, ShallowSize, SizeEstimator};
pub use stats::CacheStats;
pub use store::Cache;

// == Shared Cache ==
/// A cache shared between tasks.
///
/// Every reader can expire entries, so the whole cache sits behind one mutex
/// rather than a reader/writer lock.
pub type SharedCache<K, V> = Arc<Mutex<Cache<K, V>>>;

/// Wraps a cache for sharing between tasks.
pub fn shared<K, V>(cache: Cache<K, V>) -> SharedCache<K, V> {
    Arc::new(Mutex::new(cache))
}

//! Mini Cache - An in-memory key-value cache
//!
//! Combines four composable policies: LRU eviction bounded by entry count,
//! absolute TTL, idle timeout and size-bounded eviction. Expiry is lazy and
//! happens when an entry is observed.
//!
//! ```
//! use std::time::Duration;
//! use mini_cache::Cache;
//!
//! let mut cache: Cache<String, String> = Cache::new();
//! cache.set_max_length(2);
//!
//! cache.set("a".into(), "1".into()).unwrap();
//! cache.set("b".into(), "2".into()).unwrap();
//! cache.get("a");
//! cache.set_with_max_age("c".into(), "3".into(), Duration::from_secs(60)).unwrap();
//!
//! // "b" was least recently used
//! assert_eq!(cache.keys(), vec!["c".to_string(), "a".to_string()]);
//! ```

pub mod cache;
pub mod config;
pub mod duration;
pub mod error;
pub mod shell;
pub mod tasks;

pub use cache::{shared, Cache, CacheEvent, SharedCache};
pub use config::Config;
pub use duration::parse_duration;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;

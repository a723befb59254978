//! Property-Based Tests for Cache Module
//!
//! Uses proptest to drive random operation sequences against the cache and
//! check its structural invariants after every step.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, ManualClock};
use crate::error::Result;

// == Test Configuration ==
const TEST_MAX_LENGTH: usize = 16;

// == Strategies ==
/// Generates keys from a small alphabet so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-h]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}".prop_map(|s| s)
}

/// A single step against the cache
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    SetWithMaxAge { key: String, value: String, ms: u64 },
    Get { key: String },
    Peek { key: String },
    Remove { key: String },
    Evict,
    Advance { ms: u64 },
    SetMaxLength { n: usize },
    SetMaxAge { ms: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        2 => (key_strategy(), value_strategy(), 1u64..50)
            .prop_map(|(key, value, ms)| CacheOp::SetWithMaxAge { key, value, ms }),
        3 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Peek { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Remove { key }),
        1 => Just(CacheOp::Evict),
        2 => (1u64..20).prop_map(|ms| CacheOp::Advance { ms }),
        1 => (0usize..TEST_MAX_LENGTH).prop_map(|n| CacheOp::SetMaxLength { n }),
        1 => (0u64..60).prop_map(|ms| CacheOp::SetMaxAge { ms }),
    ]
}

fn apply(cache: &mut Cache<String, String>, clock: &ManualClock, op: CacheOp) {
    match op {
        CacheOp::Set { key, value } => cache.set(key, value).unwrap(),
        CacheOp::SetWithMaxAge { key, value, ms } => cache
            .set_with_max_age(key, value, Duration::from_millis(ms))
            .unwrap(),
        CacheOp::Get { key } => {
            cache.get(&key);
        }
        CacheOp::Peek { key } => {
            cache.peek(&key);
        }
        CacheOp::Remove { key } => {
            cache.remove(&key);
        }
        CacheOp::Evict => {
            cache.evict();
        }
        CacheOp::Advance { ms } => clock.advance(Duration::from_millis(ms)),
        CacheOp::SetMaxLength { n } => cache.set_max_length(n),
        CacheOp::SetMaxAge { ms } => cache.set_max_age(Duration::from_millis(ms)),
    }
}

fn test_cache() -> (Cache<String, String>, ManualClock) {
    let clock = ManualClock::new(0);
    (Cache::with_clock(Arc::new(clock.clone())), clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Map and recency list stay in bijection, the backward walk mirrors the
    // forward walk and cached expirations stay in sync, whatever the sequence.
    #[test]
    fn prop_structural_invariants(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let (mut cache, clock) = test_cache();

        for op in ops {
            apply(&mut cache, &clock, op);
            prop_assert!(cache.validate_invariants().is_ok(), "{:?}", cache.validate_invariants());
        }
    }

    // After a full resolve, the length equals the number of visible keys and
    // every visible key is distinct and readable.
    #[test]
    fn prop_length_matches_keys(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let (mut cache, clock) = test_cache();

        for op in ops {
            apply(&mut cache, &clock, op);
        }

        let keys = cache.keys();
        prop_assert_eq!(cache.len(), keys.len());
        let unique: HashSet<_> = keys.iter().collect();
        prop_assert_eq!(unique.len(), keys.len());
        for key in &keys {
            prop_assert!(cache.peek(key).is_some(), "key {} should resolve", key);
        }
    }

    // Hits and misses reflect exactly what `get` returned.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let (mut cache, clock) = test_cache();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Get { key } => match cache.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                other => apply(&mut cache, &clock, other),
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, cache.len(), "Total entries mismatch");
    }

    // Storing a pair and reading it back before any time passes returns it.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let (mut cache, _) = test_cache();

        cache.set(key.clone(), value.clone()).unwrap();
        prop_assert_eq!(cache.get(&key), Some(value));
    }

    // The entry count never exceeds max_length after a set.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..200),
        max_length in 1usize..TEST_MAX_LENGTH,
    ) {
        let (mut cache, _) = test_cache();
        cache.set_max_length(max_length);

        for (key, value) in entries {
            cache.set(key, value).unwrap();
            prop_assert!(
                cache.len() <= max_length,
                "Cache size {} exceeds max {}",
                cache.len(),
                max_length
            );
        }
    }

    // The estimated total never exceeds max_size after inserting a new key.
    #[test]
    fn prop_size_bound_enforcement(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..100),
        max_size in 1u64..200,
    ) {
        let (cache, _) = test_cache();
        let mut cache = cache.with_size_estimator(
            |value: &String, key: &String| -> Result<u64> { Ok((value.len() + key.len()) as u64) },
        );
        cache.set_max_size(max_size).unwrap();

        for (key, value) in entries {
            let is_new = !cache.has(&key);
            cache.set(key, value).unwrap();
            if is_new {
                prop_assert!(cache.total_size().unwrap() <= max_size);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Filling the cache and adding one more key evicts the first key set.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::hash_set("[a-z]{1,8}", 2..10),
        new_key in "[0-9]{1,4}",
    ) {
        let unique_keys: Vec<String> = initial_keys.into_iter().collect();
        let capacity = unique_keys.len();
        let (mut cache, _) = test_cache();
        cache.set_max_length(capacity);

        for key in &unique_keys {
            cache.set(key.clone(), format!("value_{}", key)).unwrap();
        }
        prop_assert_eq!(cache.len(), capacity, "Cache should be at capacity");

        cache.set(new_key.clone(), "new".to_string()).unwrap();

        prop_assert_eq!(cache.len(), capacity);
        prop_assert!(!cache.has(&unique_keys[0]), "Oldest key should have been evicted");
        prop_assert!(cache.has(&new_key));
        for key in unique_keys.iter().skip(1) {
            prop_assert!(cache.has(key), "Key '{}' should still exist", key);
        }
    }

    // A key read with `get` moves to the front and is not the next victim.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::hash_set("[a-z]{1,8}", 3..8),
        access_index in 0usize..100,
    ) {
        let unique_keys: Vec<String> = keys.into_iter().collect();
        let (mut cache, _) = test_cache();

        for key in &unique_keys {
            cache.set(key.clone(), key.clone()).unwrap();
        }

        let accessed = &unique_keys[access_index % unique_keys.len()];
        cache.get(accessed);

        let order = cache.keys();
        prop_assert_eq!(order.first(), Some(accessed));
        let (victim, _) = cache.evict().unwrap();
        prop_assert_ne!(&victim, accessed);
    }
}

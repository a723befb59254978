//! Size Estimation Module
//!
//! Pluggable sizing used by the `max_size` policy. Estimators only run while
//! size accounting is active.

use std::marker::PhantomData;
use std::mem;

use deepsize::DeepSizeOf;
use serde::Serialize;

use crate::error::Result;

// == Size Estimator ==
/// Estimates how many bytes an entry accounts for.
///
/// Errors propagate to whichever call needed the size.
pub trait SizeEstimator<K, V>: Send {
    fn estimate(&self, value: &V, key: &K) -> Result<u64>;
}

impl<K, V, F> SizeEstimator<K, V> for F
where
    F: Fn(&V, &K) -> Result<u64> + Send,
{
    fn estimate(&self, value: &V, key: &K) -> Result<u64> {
        self(value, key)
    }
}

// == Deep Size ==
/// Structural size of the key and value, heap allocations included.
///
/// The default estimator. A `String` counts its capacity on top of its
/// header, so a size bound tracks the bytes actually held.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepSize;

impl<K: DeepSizeOf, V: DeepSizeOf> SizeEstimator<K, V> for DeepSize {
    fn estimate(&self, value: &V, key: &K) -> Result<u64> {
        Ok((value.deep_size_of() + key.deep_size_of()) as u64)
    }
}

// == Shallow Size ==
/// Inline size of the key and value, ignoring anything they point to.
///
/// Works for any type and never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShallowSize;

impl<K, V> SizeEstimator<K, V> for ShallowSize {
    fn estimate(&self, value: &V, key: &K) -> Result<u64> {
        Ok((mem::size_of_val(value) + mem::size_of_val(key)) as u64)
    }
}

// == Json Size ==
/// Structural size: the length of the value serialized as JSON.
pub struct JsonSize<V>(PhantomData<fn(&V)>);

impl<V> JsonSize<V> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<V> Default for JsonSize<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V: Serialize> SizeEstimator<K, V> for JsonSize<V> {
    fn estimate(&self, value: &V, _key: &K) -> Result<u64> {
        Ok(serde_json::to_vec(value)?.len() as u64)
    }
}

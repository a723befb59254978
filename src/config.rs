//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::duration::parse_duration;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// A zero bound disables the corresponding policy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_length: usize,
    /// Default absolute TTL for entries without their own
    pub max_age: Duration,
    /// Idle timeout since last access
    pub max_idle: Duration,
    /// Maximum total size in bytes
    pub max_size: u64,
    /// Background sweep interval, zero disables the sweep task
    pub sweep_interval: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Unparseable values fall back to the default.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_LENGTH` - Maximum entries (default: 1000)
    /// - `CACHE_MAX_AGE` - Default TTL, e.g. `5m` (default: 5 minutes)
    /// - `CACHE_MAX_IDLE` - Idle timeout, e.g. `30 seconds` (default: disabled)
    /// - `CACHE_MAX_SIZE` - Maximum total bytes (default: disabled)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency, e.g. `1s` (default: 1 second)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_length: env::var("CACHE_MAX_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_length),
            max_age: duration_var("CACHE_MAX_AGE").unwrap_or(defaults.max_age),
            max_idle: duration_var("CACHE_MAX_IDLE").unwrap_or(defaults.max_idle),
            max_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_size),
            sweep_interval: duration_var("CACHE_SWEEP_INTERVAL")
                .unwrap_or(defaults.sweep_interval),
        }
    }
}

fn duration_var(name: &str) -> Option<Duration> {
    let raw = env::var(name).ok()?;
    match parse_duration(&raw) {
        Ok(duration) => Some(duration),
        Err(err) => {
            tracing::warn!("Ignoring {}: {}", name, err);
            None
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_length: 1000,
            max_age: Duration::from_secs(300),
            max_idle: Duration::ZERO,
            max_size: 0,
            sweep_interval: Duration::from_secs(1),
        }
    }
}

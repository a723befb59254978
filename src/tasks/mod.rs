//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Expiry sweep: Resolves every entry at a fixed interval so expired ones
//!   are reclaimed even if nobody reads them

mod sweep;

pub use sweep::spawn_sweep_task;

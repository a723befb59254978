//! Mini Cache - An in-memory key-value cache
//!
//! Runs an interactive shell over a single cache. Commands are read from
//! stdin, JSON answers go to stdout and logs go to stderr.

use tokio::io::{stdin, stdout, BufReader};
use tokio::signal;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_cache::shell::{self, StringCache};
use mini_cache::{shared, spawn_sweep_task, Config};

/// Main entry point for the Mini Cache shell.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache with configured bounds
/// 4. Start background expiry sweep
/// 5. Serve shell commands until EOF, QUIT or Ctrl+C
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Mini Cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_length={}, max_age={:?}, max_idle={:?}, max_size={}, sweep_interval={:?}",
        config.max_length, config.max_age, config.max_idle, config.max_size, config.sweep_interval
    );

    let mut cache = StringCache::from_config(&config).with_size_estimator(
        |value: &String, key: &String| -> mini_cache::Result<u64> {
            Ok((key.len() + value.len()) as u64)
        },
    );
    cache.on_event(|event, _value, key| {
        debug!(%event, key = %key, "Cache entry departed");
    });
    let cache = shared(cache);
    info!("Cache initialized");

    let sweep_handle = if config.sweep_interval.is_zero() {
        None
    } else {
        Some(spawn_sweep_task(cache.clone(), config.sweep_interval))
    };

    let input = BufReader::new(stdin());
    tokio::select! {
        result = shell::run(cache, input, stdout()) => result?,
        _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down..."),
    }

    if let Some(handle) = sweep_handle {
        handle.abort();
        info!("Expiry sweep stopped");
    }

    info!("Shutdown complete");
    Ok(())
}

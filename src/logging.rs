//! Tracing subscriber setup for hosts embedding plugins.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogConfig;

/// Build the filter: `RUST_LOG` wins, then the configured level.
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global fmt subscriber.
///
/// Returns `false` if a global subscriber was already set.
pub fn init(config: &LogConfig) -> bool {
    fmt()
        .with_env_filter(env_filter(config))
        .with_ansi(config.ansi)
        .try_init()
        .is_ok()
}

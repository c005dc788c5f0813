//! Logging setup.
//!
//! `RUST_LOG` takes precedence; otherwise the configured default filter
//! is used (`apod_gallery=info` unless `GALLERY_LOG` says otherwise).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Build the filter from `RUST_LOG`, falling back to `default_filter`
pub fn build_env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber; later calls are ignored
pub fn init_logging(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(build_env_filter(default_filter))
        .with(fmt::layer().with_target(false).compact())
        .try_init();
}

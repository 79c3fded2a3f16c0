//! Logger module
//!
//! Thin helpers over `tracing`:
//! - Subscriber setup from the logging configuration
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Upstream, error and warning logging

mod format;

pub use format::AccessLogEntry;

use crate::config::Config;
use crate::error::ProxyError;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
///
/// Should be called once at application startup.
pub fn init(config: &Config) {
    let default_filter = format!("{},access=info", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("Web UI gateway started ({} variant)", config.server.variant);
    tracing::info!(
        "Listening on: {}://{addr}",
        config.server.variant.scheme()
    );
    tracing::info!("Serving directory: {}", config.server.static_dir);
    tracing::info!("Storage service: {}", config.upstream.storage_url);
    tracing::info!("Scraper service: {}", config.upstream.scraper_url);
    tracing::info!("Upstream timeout: {}s", config.upstream.timeout_secs);
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    tracing::info!("======================================");
}

pub fn log_shutdown() {
    tracing::info!("Shutdown signal received, no longer accepting connections");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_upstream_failure(service: &str, url: &str, err: &ProxyError) {
    match err.upstream_status() {
        Some(status) => tracing::warn!(service, url, status = status.as_u16(), "{err}"),
        None => tracing::error!(service, url, "Upstream request failed: {err}"),
    }
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}

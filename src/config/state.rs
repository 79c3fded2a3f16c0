// Application state module
// Built once at startup and shared read-only by every connection

use super::types::Config;
use crate::proxy::{ProxyTarget, UpstreamClient};

/// Application state
pub struct AppState {
    pub config: Config,
    pub upstream: UpstreamClient,
    pub storage: ProxyTarget,
    pub scraper: ProxyTarget,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let upstream = UpstreamClient::new(config.upstream_timeout());
        let storage = ProxyTarget::new(&config.upstream.storage_url);
        let scraper = ProxyTarget::new(&config.upstream.scraper_url);

        Self {
            config,
            upstream,
            storage,
            scraper,
        }
    }
}

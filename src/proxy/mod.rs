//! Reverse proxy module
//!
//! Forwards API requests to the storage and scraper backends and relays
//! their answers back to the client.

pub mod client;
pub mod relay;
pub mod scrape;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use client::UpstreamClient;
pub use relay::RelayedResponse;
pub use scrape::ScrapeRequest;

/// Base URL of one backend service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    base_url: String,
}

impl ProxyTarget {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Absolute URL for a path (query string included) on this backend
    pub fn url_for(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{path_and_query}", self.base_url)
        } else {
            format!("{}/{path_and_query}", self.base_url)
        }
    }
}

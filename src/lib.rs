//! Front-door server for the JobCompass web UI.
//!
//! Serves the static single-page application, proxies job queries and
//! writes to the storage service, and turns scrape triggers into the
//! scraper service's multi-skill request.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod proxy;
pub mod server;
pub mod tls;

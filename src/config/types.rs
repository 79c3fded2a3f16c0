// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::fmt;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub tls: TlsConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Listening variant. Each variant carries its own defaults.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Plain HTTP
    #[default]
    Plain,
    /// HTTPS with a certificate loaded at startup
    Tls,
}

impl Variant {
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Plain => 8000,
            Self::Tls => 8443,
        }
    }

    /// The two deployments of this gateway historically pointed at different
    /// storage ports, so each variant keeps its own default.
    pub const fn default_storage_url(self) -> &'static str {
        match self {
            Self::Plain => "http://storage-service:8082",
            Self::Tls => "http://storage-service:8081",
        }
    }

    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Plain => "http",
            Self::Tls => "https",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Tls => f.write_str("tls"),
        }
    }
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub variant: Variant,
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Directory served for GET requests outside the proxied prefixes
    pub static_dir: String,
    pub index_files: Vec<String>,
}

/// Backend services the gateway forwards to
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub storage_url: String,
    pub scraper_url: String,
    /// Upper bound for a single upstream exchange, in seconds
    pub timeout_secs: u64,
}

/// Certificate and key locations for the TLS variant
#[derive(Debug, Deserialize, Clone)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub max_body_size: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Maximum lifetime of one client connection, in seconds
    pub connection_timeout: u64,
}

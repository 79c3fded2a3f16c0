use hyper::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Failures while forwarding a request to a backend service
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Inbound JSON body could not be parsed
    #[error("Invalid JSON body: {0}")]
    Parse(#[from] serde_json::Error),

    /// A numeric request parameter is not an integer
    #[error("Invalid value for {name}: {value:?}")]
    InvalidParameter { name: &'static str, value: String },

    /// Backend answered with a non-2xx status
    #[error("Backend error: {}", .0.as_u16())]
    UpstreamStatus(StatusCode),

    /// Connection, DNS or I/O failure talking to the backend
    #[error("{0}")]
    Unreachable(String),

    /// Backend exchange did not finish in time
    #[error("Backend request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Configured base URL and request path do not form a usable URI
    #[error("Invalid upstream target {0}")]
    InvalidTarget(String),
}

impl ProxyError {
    /// Status relayed to the client when the backend itself answered with an error
    pub const fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            Self::UpstreamStatus(status) => Some(*status),
            _ => None,
        }
    }
}

/// Failures while reading the inbound request
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Request body too large: {size} bytes (max: {max})")]
    BodyTooLarge { size: u64, max: u64 },

    #[error("Failed to read request body: {0}")]
    Body(String),
}

impl RequestError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Body(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Fatal errors that prevent the server from starting
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to read {what} file '{path}': {source}")]
    TlsFile {
        what: &'static str,
        path: String,
        source: std::io::Error,
    },

    #[error("No {what} found in '{path}'")]
    TlsMissing { what: &'static str, path: String },

    #[error("Invalid TLS configuration: {0}")]
    Tls(#[from] rustls::Error),

    #[error("Invalid listen address: {0}")]
    Address(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },
}

//! Outbound HTTP client for the backend services

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::http::uri::Scheme;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::error::Error as StdError;
use std::time::Duration;

use super::relay::RelayedResponse;
use crate::error::ProxyError;

/// Pooled client with a single deadline per exchange.
///
/// The deadline covers connecting, sending, and draining the response body.
/// There are no retries.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        connector.enforce_http(true);

        Self {
            client: Client::builder(TokioExecutor::new()).build(connector),
            timeout,
        }
    }

    /// Send one request and buffer the full response.
    ///
    /// Non-2xx answers, redirects included, become
    /// [`ProxyError::UpstreamStatus`]; their body is
    /// still drained so the pooled connection can be reused.
    pub async fn send(
        &self,
        method: Method,
        target: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<RelayedResponse, ProxyError> {
        let uri: Uri = target
            .parse()
            .map_err(|e| ProxyError::InvalidTarget(format!("'{target}': {e}")))?;
        if uri.scheme() != Some(&Scheme::HTTP) || uri.host().is_none() {
            return Err(ProxyError::InvalidTarget(format!(
                "'{target}': only absolute http:// URLs are supported"
            )));
        }

        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let request = builder
            .body(Full::new(body))
            .map_err(|e| ProxyError::InvalidTarget(format!("'{target}': {e}")))?;

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| ProxyError::Unreachable(describe(&e)))?;
            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| ProxyError::Unreachable(describe(&e)))?
                .to_bytes();

            Ok::<_, ProxyError>(RelayedResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        };

        let relayed = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ProxyError::Timeout(self.timeout))??;

        if relayed.status.is_success() {
            Ok(relayed)
        } else {
            Err(ProxyError::UpstreamStatus(relayed.status))
        }
    }
}

/// Error message including its source chain
/// (hyper's top-level errors alone read like "client error (Connect)")
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

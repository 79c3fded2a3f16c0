//! Storage proxy
//!
//! Forwards the request unchanged to the storage backend. Failures are
//! wrapped in a JSON `{"error": ...}` body.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode};

use super::{ProxyTarget, UpstreamClient};
use crate::http::{self, IncomingRequest};
use crate::logger;

const DEFAULT_CONTENT_TYPE: &str = "application/json";

pub async fn forward(
    client: &UpstreamClient,
    target: &ProxyTarget,
    request: &IncomingRequest,
) -> Response<Full<Bytes>> {
    let url = target.url_for(&request.path);
    let is_post = request.method == Method::POST;

    let body = if is_post {
        request.body.clone()
    } else {
        Bytes::new()
    };
    let content_type = match request.content_type() {
        Some(content_type) => Some(content_type),
        None if is_post => Some(DEFAULT_CONTENT_TYPE),
        None => None,
    };

    match client
        .send(request.method.clone(), &url, content_type, body)
        .await
    {
        Ok(relayed) => relayed.into_response(),
        Err(err) => {
            logger::log_upstream_failure("storage", &url, &err);
            let status = err
                .upstream_status()
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            http::build_json_error_response(status, &err.to_string())
        }
    }
}

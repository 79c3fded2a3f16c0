//! Inbound request model
//!
//! The router works on a fully buffered request so that dispatch can be
//! exercised without a socket. Reading the body here also guarantees the
//! client stream is drained before a response is written.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Method, Request};

use crate::error::RequestError;

/// Buffered HTTP request as seen by the router
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    /// Path including the query string, exactly as received
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IncomingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Attach a body and the matching `Content-Length`
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self.headers.insert(CONTENT_LENGTH, HeaderValue::from(self.body.len()));
        self
    }

    /// Read a hyper request, rejecting bodies larger than `max_body_size`
    pub async fn read<B>(req: Request<B>, max_body_size: u64) -> Result<Self, RequestError>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if let Some(size) = declared_length(req.headers()) {
            if size > max_body_size {
                return Err(RequestError::BodyTooLarge {
                    size,
                    max: max_body_size,
                });
            }
        }

        let (parts, body) = req.into_parts();
        let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
        let body = match Limited::new(body, limit).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                return Err(RequestError::BodyTooLarge {
                    size: max_body_size.saturating_add(1),
                    max: max_body_size,
                });
            }
            Err(e) => return Err(RequestError::Body(e.to_string())),
        };

        let path = parts
            .uri
            .path_and_query()
            .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string());

        Ok(Self {
            method: parts.method,
            path,
            headers: parts.headers,
            body,
        })
    }

    /// Path without the query string
    pub fn path_only(&self) -> &str {
        self.path.split_once('?').map_or(self.path.as_str(), |(p, _)| p)
    }

    /// Query string without the leading `?`
    pub fn query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, q)| q)
    }

    pub fn content_length(&self) -> Option<u64> {
        declared_length(&self.headers)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header_str(CONTENT_TYPE.as_str())
    }

    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    #[tokio::test]
    async fn test_read_keeps_path_and_query() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/trigger-scrape?skills=go,rust")
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from_static(b"{}")))
            .unwrap();

        let incoming = IncomingRequest::read(req, 1024).await.unwrap();
        assert_eq!(incoming.method, Method::POST);
        assert_eq!(incoming.path, "/api/trigger-scrape?skills=go,rust");
        assert_eq!(incoming.path_only(), "/api/trigger-scrape");
        assert_eq!(incoming.query(), Some("skills=go,rust"));
        assert_eq!(incoming.content_type(), Some("application/json"));
        assert_eq!(&incoming.body[..], b"{}");
    }

    #[tokio::test]
    async fn test_read_rejects_declared_oversize_body() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/jobs")
            .header("Content-Length", "2048")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let err = IncomingRequest::read(req, 1024).await.unwrap_err();
        assert!(matches!(err, RequestError::BodyTooLarge { size: 2048, max: 1024 }));
    }

    #[tokio::test]
    async fn test_read_rejects_undeclared_oversize_body() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/jobs")
            .body(Full::new(Bytes::from(vec![b'x'; 64])))
            .unwrap();

        let err = IncomingRequest::read(req, 16).await.unwrap_err();
        assert!(matches!(err, RequestError::BodyTooLarge { max: 16, .. }));
    }

    #[test]
    fn test_with_body_sets_content_length() {
        let req = IncomingRequest::new(Method::POST, "/api/jobs").with_body(r#"{"x":1}"#);
        assert_eq!(req.content_length(), Some(7));
        assert_eq!(req.query(), None);
    }
}

//! In-process fake backend for proxy tests

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Canned answer returned for every request
#[derive(Debug, Clone)]
pub struct BackendReply {
    status: StatusCode,
    headers: Vec<(&'static str, &'static str)>,
    body: Bytes,
    delay: Option<Duration>,
}

impl BackendReply {
    pub fn json(status: StatusCode, body: &'static str) -> Self {
        Self {
            status,
            headers: vec![("content-type", "application/json")],
            body: Bytes::from_static(body.as_bytes()),
            delay: None,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// What the backend received
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl SeenRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub struct Backend {
    addr: SocketAddr,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl Backend {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn single_request(&self) -> SeenRequest {
        let seen = self.requests();
        assert_eq!(seen.len(), 1, "expected exactly one backend request");
        seen.into_iter().next().unwrap()
    }
}

pub async fn spawn_backend(reply: BackendReply) -> Backend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let recorder = Arc::clone(&seen);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let reply = reply.clone();
            let recorder = Arc::clone(&recorder);
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let reply = reply.clone();
                    let recorder = Arc::clone(&recorder);
                    async move {
                        let (parts, body) = req.into_parts();
                        let body = body.collect().await?.to_bytes();
                        recorder.lock().unwrap().push(SeenRequest {
                            method: parts.method,
                            path: parts
                                .uri
                                .path_and_query()
                                .map_or_else(String::new, |pq| pq.as_str().to_string()),
                            content_type: parts
                                .headers
                                .get("content-type")
                                .and_then(|v| v.to_str().ok())
                                .map(ToString::to_string),
                            body,
                        });

                        if let Some(delay) = reply.delay {
                            tokio::time::sleep(delay).await;
                        }

                        let mut builder = Response::builder().status(reply.status);
                        for (name, value) in &reply.headers {
                            builder = builder.header(*name, *value);
                        }
                        Ok::<_, hyper::Error>(builder.body(Full::new(reply.body)).unwrap())
                    }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    Backend { addr, seen }
}

/// Loopback address with nothing listening on it
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

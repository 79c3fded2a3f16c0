//! Request routing dispatch module
//!
//! Classifies each request by method and path, dispatches it to the static
//! responder or one of the proxies, and finalizes the response headers.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, Version};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, IncomingRequest};
use crate::logger::{self, AccessLogEntry};
use crate::proxy::{scrape, storage};

const JOBS_PREFIX: &str = "/api/jobs";
const TRIGGER_SCRAPE_PREFIX: &str = "/api/trigger-scrape";
const API_PREFIX: &str = "/api/";

/// Handler chosen for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Static,
    StorageProxy,
    ScrapeTrigger,
    Preflight,
    NotFound,
    MethodNotAllowed,
}

impl Route {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::StorageProxy => "storage",
            Self::ScrapeTrigger => "scraper",
            Self::Preflight => "preflight",
            Self::NotFound => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
        }
    }
}

/// Pick the handler for `method` and `path` (query string included).
///
/// | Method  | Path prefix            | Route         |
/// |---------|------------------------|---------------|
/// | OPTIONS | any                    | Preflight     |
/// | GET     | `/api/jobs`            | StorageProxy  |
/// | GET/HEAD| other                  | Static        |
/// | POST    | `/api/trigger-scrape`  | ScrapeTrigger |
/// | POST    | `/api/`                | StorageProxy  |
/// | POST    | other                  | NotFound      |
pub fn classify(method: &Method, path: &str) -> Route {
    match *method {
        Method::OPTIONS => Route::Preflight,
        Method::GET if path.starts_with(JOBS_PREFIX) => Route::StorageProxy,
        Method::GET | Method::HEAD => Route::Static,
        Method::POST if path.starts_with(TRIGGER_SCRAPE_PREFIX) => Route::ScrapeTrigger,
        Method::POST if path.starts_with(API_PREFIX) => Route::StorageProxy,
        Method::POST => Route::NotFound,
        _ => Route::MethodNotAllowed,
    }
}

/// Something that turns a buffered request into a response
pub trait RequestHandler {
    fn handle(
        &self,
        request: IncomingRequest,
    ) -> impl Future<Output = Response<Full<Bytes>>> + Send;
}

/// The gateway's single request handler
#[derive(Clone)]
pub struct Router {
    state: Arc<AppState>,
}

impl RequestHandler for Router {
    async fn handle(&self, request: IncomingRequest) -> Response<Full<Bytes>> {
        let route = classify(&request.method, &request.path);
        self.respond(route, &request).await
    }
}

impl Router {
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Transport entry point: read the body, handle, write the access log
    pub async fn serve<B>(&self, req: Request<B>, remote_addr: SocketAddr) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let started = Instant::now();
        let mut entry = self.state.config.logging.access_log.then(|| {
            let mut entry = AccessLogEntry::new(
                remote_addr.ip().to_string(),
                req.method().to_string(),
                req.uri().to_string(),
            );
            entry.http_version = version_label(req.version()).to_string();
            entry.referer = header_string(&req, "referer");
            entry.user_agent = header_string(&req, "user-agent");
            entry
        });

        let (route, response) =
            match IncomingRequest::read(req, self.state.config.http.max_body_size).await {
                Ok(request) => {
                    let route = classify(&request.method, &request.path);
                    (route.name(), self.respond(route, &request).await)
                }
                Err(err) => {
                    logger::log_warning(&err.to_string());
                    ("rejected", http::finalize(http::build_request_error_response(&err)))
                }
            };

        if let Some(entry) = entry.as_mut() {
            entry.route = route;
            entry.status = response.status().as_u16();
            entry.body_bytes = response
                .body()
                .size_hint()
                .exact()
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(0);
            entry.request_time_us =
                u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
            logger::log_access(entry, &self.state.config.logging.access_log_format);
        }

        response
    }

    async fn respond(&self, route: Route, request: &IncomingRequest) -> Response<Full<Bytes>> {
        http::finalize(self.dispatch(route, request).await)
    }

    async fn dispatch(&self, route: Route, request: &IncomingRequest) -> Response<Full<Bytes>> {
        let state = &self.state;
        match route {
            Route::Static => {
                static_files::serve(
                    request,
                    &state.config.server.static_dir,
                    &state.config.server.index_files,
                )
                .await
            }
            Route::StorageProxy => storage::forward(&state.upstream, &state.storage, request).await,
            Route::ScrapeTrigger => scrape::trigger(&state.upstream, &state.scraper, request).await,
            Route::Preflight => http::build_options_response(),
            Route::NotFound => http::build_404_response(),
            Route::MethodNotAllowed => {
                logger::log_warning(&format!("Method not allowed: {}", request.method));
                http::build_405_response()
            }
        }
    }
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

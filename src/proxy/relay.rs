//! Response relay shared by both proxies

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, TRANSFER_ENCODING};
use hyper::{Response, StatusCode};

/// Fully buffered backend response
#[derive(Debug, Clone)]
pub struct RelayedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RelayedResponse {
    /// Client response with the backend's status, headers and body.
    ///
    /// `Transfer-Encoding` is dropped: the body is already de-chunked and the
    /// server frames it again on the way out.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            if name != TRANSFER_ENCODING {
                headers.append(name, value.clone());
            }
        }
        response
    }
}

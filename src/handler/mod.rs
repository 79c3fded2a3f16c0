//! Request handler module
//!
//! Routes each request to the static file responder or to one of the
//! backend proxies.

pub mod router;
pub mod static_files;

pub use router::{classify, RequestHandler, Route, Router};

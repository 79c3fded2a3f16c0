//! HTTP protocol layer module
//!
//! Protocol helpers shared by the router, the static responder and the proxies.

pub mod mime;
pub mod request;
pub mod response;

pub use request::IncomingRequest;
pub use response::{
    apply_cors, build_404_response, build_405_response, build_file_response,
    build_json_error_response, build_options_response, build_redirect_response,
    build_request_error_response, build_status_response, finalize,
};

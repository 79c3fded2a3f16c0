//! Static file serving module
//!
//! Maps URL paths onto the configured asset directory.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::http::{self, mime, IncomingRequest};
use crate::logger;

/// Outcome of mapping a URL path onto the asset directory
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    /// Directory requested without a trailing slash
    Redirect(String),
    NotFound,
}

/// Serve a GET or HEAD request from `root`
pub async fn serve(
    request: &IncomingRequest,
    root: &str,
    index_files: &[String],
) -> Response<Full<Bytes>> {
    let file_path = match resolve(Path::new(root), request.path_only(), index_files).await {
        Resolved::File(path) => path,
        Resolved::Redirect(location) => {
            let location = match request.query() {
                Some(query) => format!("{location}?{query}"),
                None => location,
            };
            return http::build_redirect_response(&location);
        }
        Resolved::NotFound => return http::build_404_response(),
    };

    match fs::read(&file_path).await {
        Ok(content) => http::build_file_response(
            Bytes::from(content),
            mime::content_type_for(&file_path),
            request.method == Method::HEAD,
        ),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path.display()
            ));
            http::build_404_response()
        }
    }
}

/// Map a URL path to a file below `root`.
///
/// The path is percent-decoded, `..` segments are refused, and the final
/// canonical path must stay inside the canonical root (symlinks included).
pub async fn resolve(root: &Path, url_path: &str, index_files: &[String]) -> Resolved {
    let Ok(decoded) = urlencoding::decode(url_path) else {
        return Resolved::NotFound;
    };

    let relative = Path::new(decoded.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        logger::log_warning(&format!("Path traversal attempt blocked: {url_path}"));
        return Resolved::NotFound;
    }

    let root_canonical = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{}': {e}",
                root.display()
            ));
            return Resolved::NotFound;
        }
    };

    let mut file_path = root_canonical.join(relative);
    if fs::metadata(&file_path).await.is_ok_and(|m| m.is_dir()) {
        if !url_path.ends_with('/') {
            return Resolved::Redirect(format!("{url_path}/"));
        }
        let mut index = None;
        for name in index_files {
            let candidate = file_path.join(name);
            if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
                index = Some(candidate);
                break;
            }
        }
        let Some(index) = index else {
            return Resolved::NotFound;
        };
        file_path = index;
    }

    // Missing files are the common 404 case and are not logged
    let Ok(canonical) = fs::canonicalize(&file_path).await else {
        return Resolved::NotFound;
    };
    if !canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {url_path} -> {}",
            canonical.display()
        ));
        return Resolved::NotFound;
    }
    if !fs::metadata(&canonical).await.is_ok_and(|m| m.is_file()) {
        return Resolved::NotFound;
    }

    Resolved::File(canonical)
}

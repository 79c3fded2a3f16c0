//! Scrape-trigger proxy
//!
//! Builds a multi-skill scrape request from the inbound JSON body and query
//! string, then posts it to the scraper backend. Each field is resolved on
//! its own: body value first, then the first query value, then the default.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ProxyTarget, UpstreamClient};
use crate::error::ProxyError;
use crate::http::{self, IncomingRequest};
use crate::logger;

/// Scraper endpoint accepting [`ScrapeRequest`]
pub const TRIGGER_PATH: &str = "/api/scraper/trigger/multi-skill";

const DEFAULT_MAX_JOB_AGE_DAYS: i64 = 1;
const DEFAULT_MAX_RESULTS: i64 = 10;

/// Payload sent to the scraper backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    pub skills: Vec<String>,
    pub location: Option<String>,
    pub max_job_age_days: i64,
    pub max_results: i64,
    /// Optional session cookie the scraper uses for authenticated searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_cookie: Option<String>,
}

/// Inbound JSON body; every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeBody {
    skills: Option<Vec<String>>,
    location: Option<String>,
    max_job_age_days: Option<i64>,
    max_results: Option<i64>,
    auth_cookie: Option<String>,
}

/// First non-empty value per key
#[derive(Debug, Default)]
struct QueryParams {
    skills: Option<String>,
    location: Option<String>,
    max_job_age_days: Option<String>,
    max_results: Option<String>,
}

impl QueryParams {
    fn parse(query: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(query) = query else {
            return params;
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "skills" => &mut params.skills,
                "location" => &mut params.location,
                "maxJobAgeDays" => &mut params.max_job_age_days,
                "maxResults" => &mut params.max_results,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

impl ScrapeRequest {
    /// Merge body and query string into the outbound payload.
    ///
    /// `body` is `None` when the request carried no `Content-Length`; an
    /// empty or all-whitespace body counts as `{}`.
    pub fn resolve(query: Option<&str>, body: Option<&[u8]>) -> Result<Self, ProxyError> {
        let body = match body {
            Some(bytes) if !bytes.trim_ascii().is_empty() => {
                serde_json::from_slice::<ScrapeBody>(bytes)?
            }
            _ => ScrapeBody::default(),
        };
        let query = QueryParams::parse(query);

        let skills = body
            .skills
            .or_else(|| {
                query
                    .skills
                    .map(|s| s.split(',').map(ToString::to_string).collect())
            })
            .unwrap_or_default()
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();

        let max_job_age_days = match body.max_job_age_days {
            Some(days) => days,
            None => parse_int("maxJobAgeDays", query.max_job_age_days)?
                .unwrap_or(DEFAULT_MAX_JOB_AGE_DAYS),
        };
        let max_results = match body.max_results {
            Some(results) => results,
            None => parse_int("maxResults", query.max_results)?.unwrap_or(DEFAULT_MAX_RESULTS),
        };

        Ok(Self {
            skills,
            location: body.location.or(query.location),
            max_job_age_days,
            max_results,
            auth_cookie: body.auth_cookie,
        })
    }

    pub fn from_request(request: &IncomingRequest) -> Result<Self, ProxyError> {
        let body = request.content_length().map(|_| &request.body[..]);
        Self::resolve(request.query(), body)
    }
}

fn parse_int(name: &'static str, value: Option<String>) -> Result<Option<i64>, ProxyError> {
    value
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| ProxyError::InvalidParameter { name, value: v })
        })
        .transpose()
}

/// Handle `POST /api/trigger-scrape*`.
///
/// Success relays the scraper's answer. A scraper error status is relayed
/// without headers or body; every other failure is a bare 500.
pub async fn trigger(
    client: &UpstreamClient,
    target: &ProxyTarget,
    request: &IncomingRequest,
) -> Response<Full<Bytes>> {
    let url = target.url_for(TRIGGER_PATH);

    let payload = match ScrapeRequest::from_request(request)
        .and_then(|scrape| serde_json::to_vec(&scrape).map_err(ProxyError::from))
    {
        Ok(payload) => payload,
        Err(err) => {
            logger::log_warning(&format!("Rejected scrape trigger {}: {err}", request.path));
            return http::build_status_response(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    match client
        .send(
            Method::POST,
            &url,
            Some("application/json"),
            Bytes::from(payload),
        )
        .await
    {
        Ok(relayed) => relayed.into_response(),
        Err(err) => {
            logger::log_upstream_failure("scraper", &url, &err);
            http::build_status_response(
                err.upstream_status()
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            )
        }
    }
}

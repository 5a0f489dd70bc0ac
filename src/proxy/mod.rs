//! The image proxy handler.
//!
//! [`image_proxy_handler`] serves `GET /image-proxy?url=...`: it reads
//! the `url` query parameter, validates it against the allow-list
//! ([`target`]), fetches it ([`upstream`]), and answers with the image
//! bytes or a JSON [`ProxyError`]. Each gate either passes through or
//! short-circuits into an error response.

pub mod error;
pub mod target;
pub mod upstream;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

pub use error::{ErrorBody, ErrorClass, ProxyError};

use crate::server::AppState;
use upstream::{FetchRequest, UpstreamImage};

pub const IMAGE_PROXY_PATH: &str = "/image-proxy";
pub const CACHE_CONTROL: &str = "public, max-age=86400";
pub const CORRELATION_HEADER: &str = "x-correlation-id";
pub const MAX_CORRELATION_ID_LEN: usize = 128;

pub async fn image_proxy_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    uri: Uri,
    req_headers: HeaderMap,
) -> Response {
    let correlation_id = correlation_id(&req_headers);

    let raw_url = url_param(uri.query());

    let mut response = match proxy_image(&state, raw_url.as_deref()).await {
        Ok(image) => {
            state.stats.proxied.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                correlation_id = %correlation_id,
                client_ip = %addr.ip(),
                upstream = %image.final_url,
                redirects = image.redirects,
                bytes = image.body.len(),
                latency_ms = image.latency_ms,
                "image proxied"
            );
            image_response(image)
        }
        Err(e) => {
            log_failure(&e, &correlation_id, &addr, raw_url.as_deref());
            match e.class() {
                ErrorClass::Input | ErrorClass::Policy => {
                    state.stats.rejected.fetch_add(1, Ordering::Relaxed);
                }
                ErrorClass::Upstream => {
                    state.stats.failed.fetch_add(1, Ordering::Relaxed);
                }
            }
            e.into_response()
        }
    };

    if let Ok(val) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, val);
    }
    response
}

/// Run the validation gates and the upstream fetch for one raw `url` value.
pub async fn proxy_image(
    state: &AppState,
    raw_url: Option<&str>,
) -> Result<UpstreamImage, ProxyError> {
    let raw_url = raw_url
        .filter(|u| !u.is_empty())
        .ok_or(ProxyError::MissingUrl)?;

    let config = &state.config;
    let target = target::parse_target(raw_url, &config.allowed_suffix)?;

    upstream::fetch_image(FetchRequest {
        client: &state.http_client,
        target,
        allowed_suffix: &config.allowed_suffix,
        settings: &config.upstream,
    })
    .await
}

/// The caller's `x-correlation-id` when it is short printable ASCII,
/// otherwise a fresh UUID.
#[must_use]
pub fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|id| {
            (1..=MAX_CORRELATION_ID_LEN).contains(&id.len())
                && id.bytes().all(|b| b.is_ascii_graphic())
        })
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from)
}

/// First `url` value in the query string, percent-decoded.
#[must_use]
pub fn url_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
}

fn image_response(image: UpstreamImage) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, image.content_type)
        .header(header::CACHE_CONTROL, CACHE_CONTROL)
        .body(Body::from(image.body))
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to build response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

fn log_failure(err: &ProxyError, correlation_id: &str, addr: &SocketAddr, raw_url: Option<&str>) {
    let status = err.status().as_u16();
    let url = raw_url.unwrap_or("");
    match err {
        ProxyError::MissingUrl => {
            tracing::warn!(correlation_id, client_ip = %addr.ip(), status, "missing url parameter");
        }
        ProxyError::InvalidUrl { reason } => {
            tracing::warn!(correlation_id, client_ip = %addr.ip(), status, url, reason = %reason, "invalid url");
        }
        ProxyError::DomainNotAllowed { host } => {
            tracing::warn!(correlation_id, client_ip = %addr.ip(), status, url, host = %host, "domain not allowed");
        }
        ProxyError::UpstreamStatus { .. } => {
            tracing::warn!(correlation_id, status, url, "upstream returned non-success status");
        }
        ProxyError::UpstreamUnavailable { detail } => {
            tracing::error!(correlation_id, status, url, error = %detail, "upstream request failed");
        }
        ProxyError::UpstreamTimeout => {
            tracing::error!(correlation_id, status, url, "upstream request timed out");
        }
        ProxyError::TooManyRedirects => {
            tracing::error!(correlation_id, status, url, "upstream redirect limit exceeded");
        }
        ProxyError::TooLarge { limit } => {
            tracing::error!(correlation_id, status, url, limit, "upstream image exceeds size limit");
        }
    }
}

//! Outbound fetch of a validated image URL.
//!
//! One GET per hop, redirects re-checked against the allow-list, the
//! whole exchange bounded by the configured timeout, and the body
//! buffered up to `max_body` bytes before anything is returned.

use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap, HeaderValue, Method};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use url::Url;

use super::error::ProxyError;
use super::target::{check_target, ParsedTarget};
use crate::config::model::UpstreamSettings;
use crate::server::HttpClient;

pub const FALLBACK_CONTENT_TYPE: &str = "image/png";

const ACCEPT: &str = "image/*,*/*;q=0.8";
const USER_AGENT: &str = concat!("imgrelay/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct UpstreamImage {
    pub content_type: HeaderValue,
    pub body: Bytes,
    pub final_url: Url,
    pub redirects: u8,
    pub latency_ms: u64,
}

pub struct FetchRequest<'a> {
    pub client: &'a HttpClient,
    pub target: ParsedTarget,
    pub allowed_suffix: &'a str,
    pub settings: &'a UpstreamSettings,
}

#[allow(clippy::cast_possible_truncation)]
pub async fn fetch_image(req: FetchRequest<'_>) -> Result<UpstreamImage, ProxyError> {
    let start = Instant::now();
    let timeout = Duration::from_millis(req.settings.timeout);

    let mut image = tokio::time::timeout(timeout, follow(req))
        .await
        .map_err(|_| ProxyError::UpstreamTimeout)??;

    image.latency_ms = start.elapsed().as_millis() as u64;
    Ok(image)
}

async fn follow(req: FetchRequest<'_>) -> Result<UpstreamImage, ProxyError> {
    let mut current = req.target;
    let mut redirects: u8 = 0;

    loop {
        let response = send_get(req.client, &current.url).await?;
        let status = response.status();

        if status.is_redirection() && req.settings.max_redirects > 0 {
            if let Some(next) = redirect_location(&current.url, response.headers())? {
                if redirects >= req.settings.max_redirects {
                    return Err(ProxyError::TooManyRedirects);
                }
                redirects += 1;
                tracing::debug!(
                    from = %current.url,
                    to = %next,
                    status = status.as_u16(),
                    "following upstream redirect"
                );
                current = check_hop(next, req.allowed_suffix)?;
                continue;
            }
        }

        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus { status });
        }

        let max_body = req.settings.max_body;
        if declared_length(response.headers()).is_some_and(|len| len > max_body as u64) {
            return Err(ProxyError::TooLarge { limit: max_body });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));

        let body = Limited::new(response.into_body(), max_body)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    ProxyError::TooLarge { limit: max_body }
                } else {
                    ProxyError::UpstreamUnavailable {
                        detail: format!("body read error: {e}"),
                    }
                }
            })?
            .to_bytes();

        return Ok(UpstreamImage {
            content_type,
            body,
            final_url: current.url,
            redirects,
            latency_ms: 0,
        });
    }
}

async fn send_get(
    client: &HttpClient,
    url: &Url,
) -> Result<hyper::Response<hyper::body::Incoming>, ProxyError> {
    // Fragments never go on the wire.
    let mut url = url.clone();
    url.set_fragment(None);

    let uri: hyper::Uri = url
        .as_str()
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| ProxyError::UpstreamUnavailable {
            detail: format!("unrepresentable URI: {e}"),
        })?;

    let request = hyper::Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::USER_AGENT, USER_AGENT)
        .header(header::ACCEPT, ACCEPT)
        .body(Full::new(Bytes::new()))
        .map_err(|e| ProxyError::UpstreamUnavailable {
            detail: e.to_string(),
        })?;

    client
        .request(request)
        .await
        .map_err(|e| ProxyError::UpstreamUnavailable {
            detail: error_chain(&e),
        })
}

/// Resolve a redirect's `Location` against the URL that produced it.
/// `Ok(None)` means there is nothing to follow.
fn redirect_location(base: &Url, headers: &HeaderMap) -> Result<Option<Url>, ProxyError> {
    let Some(location) = headers.get(header::LOCATION) else {
        return Ok(None);
    };
    let location = location
        .to_str()
        .map_err(|_| ProxyError::UpstreamUnavailable {
            detail: "redirect location is not valid ASCII".into(),
        })?;
    base.join(location)
        .map(Some)
        .map_err(|e| ProxyError::UpstreamUnavailable {
            detail: format!("invalid redirect location '{location}': {e}"),
        })
}

/// Re-run the target gates on a redirect hop. The client's URL was fine,
/// so an unusable hop is an upstream fault; a foreign host stays a 403.
fn check_hop(next: Url, allowed_suffix: &str) -> Result<ParsedTarget, ProxyError> {
    check_target(next, allowed_suffix).map_err(|e| match e {
        ProxyError::InvalidUrl { reason } => ProxyError::UpstreamUnavailable {
            detail: format!("redirect to unsupported target: {reason}"),
        },
        other => other,
    })
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// hyper-util's client error only says "client error (Connect)";
/// the useful part is further down the source chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

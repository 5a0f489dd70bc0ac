//! Target URL parsing and the hostname allow-list.
//!
//! Every URL the proxy touches, the initial one and each redirect hop,
//! goes through [`check_target`] so the allow-list cannot be bypassed by
//! an upstream redirect.

use url::Url;

use super::error::ProxyError;

#[derive(Debug, Clone)]
pub struct ParsedTarget {
    pub url: Url,
    pub host: String,
}

/// Parse `raw` as an absolute http(s) URL and check it against `allowed_suffix`.
pub fn parse_target(raw: &str, allowed_suffix: &str) -> Result<ParsedTarget, ProxyError> {
    let url = Url::parse(raw).map_err(|e| ProxyError::InvalidUrl {
        reason: e.to_string(),
    })?;
    check_target(url, allowed_suffix)
}

/// Apply the scheme and allow-list gates to an already parsed URL.
pub fn check_target(url: Url, allowed_suffix: &str) -> Result<ParsedTarget, ProxyError> {
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ProxyError::InvalidUrl {
            reason: format!("unsupported scheme '{scheme}'"),
        });
    }

    // Special schemes always carry a host; `url` has already lowercased it.
    let host = url
        .host_str()
        .ok_or_else(|| ProxyError::InvalidUrl {
            reason: "missing host".into(),
        })?
        .to_string();

    if !host_allowed(&host, allowed_suffix) {
        return Err(ProxyError::DomainNotAllowed { host });
    }

    Ok(ParsedTarget { url, host })
}

#[must_use]
pub fn host_allowed(host: &str, allowed_suffix: &str) -> bool {
    !allowed_suffix.is_empty() && host.ends_with(allowed_suffix)
}

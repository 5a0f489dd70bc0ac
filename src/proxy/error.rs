//! Per-request failures and their HTTP mapping.
//!
//! Each [`ProxyError`] is terminal for its request. The `Display` text is
//! exactly what the client sees in the `{"error": ...}` body; anything
//! more detailed (the offending host, the transport error) stays in the
//! variant fields and only reaches the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Input,
    Policy,
    Upstream,
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("url parameter is required")]
    MissingUrl,

    #[error("invalid URL")]
    InvalidUrl { reason: String },

    #[error("domain not allowed")]
    DomainNotAllowed { host: String },

    #[error("failed to fetch image ({})", status.as_u16())]
    UpstreamStatus { status: StatusCode },

    #[error("failed to fetch image")]
    UpstreamUnavailable { detail: String },

    #[error("failed to fetch image: upstream timed out")]
    UpstreamTimeout,

    #[error("failed to fetch image: too many redirects")]
    TooManyRedirects,

    #[error("failed to fetch image: image too large")]
    TooLarge { limit: usize },
}

impl ProxyError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::MissingUrl | Self::InvalidUrl { .. } => ErrorClass::Input,
            Self::DomainNotAllowed { .. } => ErrorClass::Policy,
            Self::UpstreamStatus { .. }
            | Self::UpstreamUnavailable { .. }
            | Self::UpstreamTimeout
            | Self::TooManyRedirects
            | Self::TooLarge { .. } => ErrorClass::Upstream,
        }
    }

    /// Status sent to the client; upstream statuses are mirrored as-is.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingUrl | Self::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
            Self::DomainNotAllowed { .. } => StatusCode::FORBIDDEN,
            Self::UpstreamStatus { status } => *status,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::UpstreamUnavailable { .. } | Self::TooManyRedirects | Self::TooLarge { .. } => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_bad_request() {
        assert_eq!(ProxyError::MissingUrl.status(), StatusCode::BAD_REQUEST);
        let invalid = ProxyError::InvalidUrl {
            reason: "relative URL without a base".into(),
        };
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.class(), ErrorClass::Input);
        assert_eq!(invalid.to_string(), "invalid URL");
    }

    #[test]
    fn policy_error_hides_host() {
        let err = ProxyError::DomainNotAllowed {
            host: "evil.example.com".into(),
        };
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert!(!err.to_string().contains("evil"));
    }

    #[test]
    fn upstream_status_is_mirrored() {
        let err = ProxyError::UpstreamStatus {
            status: StatusCode::NOT_FOUND,
        };
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "failed to fetch image (404)");
    }

    #[test]
    fn transport_failures_map_to_gateway_statuses() {
        assert_eq!(ProxyError::UpstreamTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(ProxyError::TooManyRedirects.status(), StatusCode::BAD_GATEWAY);
        let err = ProxyError::UpstreamUnavailable {
            detail: "dns error: no record found".into(),
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "failed to fetch image");
    }
}

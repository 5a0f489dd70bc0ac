//! Process-level error types for imgrelay.
//!
//! Defines [`RelayError`] (startup, config and CLI failures) and
//! [`ValidationError`] for config validation failures. Per-request
//! failures live in [`proxy::ProxyError`](crate::proxy::ProxyError)
//! because they map onto HTTP responses rather than exit codes.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RelayError {
    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display_includes_suggestion() {
        let err = ValidationError {
            field: "allowed_suffix".into(),
            message: "must not contain a scheme".into(),
            suggestion: Some("did you mean '.supabase.co'?".into()),
        };
        assert_eq!(
            err.to_string(),
            "  allowed_suffix: must not contain a scheme (did you mean '.supabase.co'?)"
        );
    }

    #[test]
    fn config_validation_lists_every_error() {
        let err = RelayError::ConfigValidation {
            errors: vec![
                ValidationError {
                    field: "allowed_suffix".into(),
                    message: "cannot be empty".into(),
                    suggestion: None,
                },
                ValidationError {
                    field: "upstream.timeout".into(),
                    message: "must be greater than 0".into(),
                    suggestion: None,
                },
            ],
        };
        let rendered = err.to_string();
        assert!(rendered.contains("allowed_suffix: cannot be empty"));
        assert!(rendered.contains("upstream.timeout: must be greater than 0"));
    }
}

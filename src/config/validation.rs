//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for values that
//! would make the allow-list meaningless or the upstream client unusable,
//! returning every [`ValidationError`] found with per-field suggestions.

use super::model::Config;
use crate::error::ValidationError;

pub const MAX_REDIRECTS_LIMIT: u8 = 20;

/// Validate the allowed hostname suffix. Returns `Ok(())` or a human-readable error.
pub fn validate_suffix(suffix: &str) -> Result<(), String> {
    if suffix.is_empty() {
        return Err("suffix cannot be empty (it would allow every host)".into());
    }
    if suffix.contains("://") {
        return Err("suffix must be a hostname ending, not a URL".into());
    }
    if suffix.chars().any(char::is_whitespace) {
        return Err("suffix cannot contain whitespace".into());
    }
    // Parsed hosts are punycode, so a Unicode suffix would never match.
    if !suffix.is_ascii() {
        return Err("suffix must be ASCII (use the punycode form, e.g. 'xn--bcher-kva.de')".into());
    }
    if let Some(bad) = suffix.chars().find(|c| matches!(*c, '/' | ':' | '*' | '?' | '#' | '@')) {
        return Err(format!("suffix cannot contain '{bad}'"));
    }
    Ok(())
}

/// Suggest a bare hostname ending when the user pasted a URL or a wildcard.
fn suggest_suffix(suffix: &str) -> Option<String> {
    let without_scheme = suffix.split_once("://").map_or(suffix, |(_, rest)| rest);
    let host = without_scheme.split(['/', ':', '?', '#']).next()?;
    let host = host.trim_start_matches('*');
    if host.is_empty() || host == suffix {
        return None;
    }
    Some(format!("did you mean '{host}'?"))
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(msg) = validate_suffix(&config.allowed_suffix) {
        errors.push(ValidationError {
            field: "allowed_suffix".into(),
            message: msg,
            suggestion: suggest_suffix(&config.allowed_suffix),
        });
    }

    let upstream = &config.upstream;
    if upstream.timeout == 0 {
        errors.push(ValidationError {
            field: "upstream.timeout".into(),
            message: "must be greater than 0".into(),
            suggestion: Some("values are in milliseconds, e.g. 10000".into()),
        });
    }

    if upstream.max_body == 0 {
        errors.push(ValidationError {
            field: "upstream.max_body".into(),
            message: "must be greater than 0".into(),
            suggestion: None,
        });
    }

    if upstream.max_redirects > MAX_REDIRECTS_LIMIT {
        errors.push(ValidationError {
            field: "upstream.max_redirects".into(),
            message: format!(
                "{} redirects requested, at most {MAX_REDIRECTS_LIMIT} allowed",
                upstream.max_redirects
            ),
            suggestion: None,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let upstream = &config.upstream;
    let redirects = if upstream.max_redirects == 0 {
        "disabled".to_string()
    } else {
        format!("up to {}", upstream.max_redirects)
    };

    format!(
        "{path} is valid\n  \
         allowed suffix: {}\n  \
         timeout:        {}ms\n  \
         redirects:      {redirects}\n  \
         max body:       {} bytes",
        config.allowed_suffix, upstream.timeout, upstream.max_body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::UpstreamSettings;

    fn config_with_suffix(suffix: &str) -> Config {
        Config {
            allowed_suffix: suffix.into(),
            upstream: UpstreamSettings::default(),
        }
    }

    #[test]
    fn default_config_passes() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn empty_suffix_fails() {
        let errors = validate(&config_with_suffix("")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("cannot be empty"));
    }

    #[test]
    fn url_as_suffix_fails_with_suggestion() {
        let errors = validate(&config_with_suffix("https://abc.supabase.co/storage")).unwrap_err();
        assert!(errors[0].message.contains("not a URL"));
        assert_eq!(
            errors[0].suggestion.as_deref(),
            Some("did you mean 'abc.supabase.co'?")
        );
    }

    #[test]
    fn wildcard_suffix_fails_with_suggestion() {
        let errors = validate(&config_with_suffix("*.supabase.co")).unwrap_err();
        assert!(errors[0].message.contains("'*'"));
        assert_eq!(
            errors[0].suggestion.as_deref(),
            Some("did you mean '.supabase.co'?")
        );
    }

    #[test]
    fn port_in_suffix_fails() {
        let errors = validate(&config_with_suffix(".example.com:443")).unwrap_err();
        assert!(errors[0].message.contains("':'"));
    }

    #[test]
    fn unicode_suffix_fails() {
        let errors = validate(&config_with_suffix(".bücher.de")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("punycode"));
        assert!(validate(&config_with_suffix(".xn--bcher-kva.de")).is_ok());
    }

    #[test]
    fn zero_timeout_and_body_fail_together() {
        let config = Config {
            allowed_suffix: ".supabase.co".into(),
            upstream: UpstreamSettings {
                timeout: 0,
                max_redirects: 5,
                max_body: 0,
            },
        };
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "upstream.timeout"));
        assert!(errors.iter().any(|e| e.field == "upstream.max_body"));
    }

    #[test]
    fn too_many_redirects_fails() {
        let config = Config {
            allowed_suffix: ".supabase.co".into(),
            upstream: UpstreamSettings {
                max_redirects: 50,
                ..UpstreamSettings::default()
            },
        };
        let errors = validate(&config).unwrap_err();
        assert!(errors[0].message.contains("at most 20"));
    }

    #[test]
    fn report_mentions_disabled_redirects() {
        let config = Config {
            allowed_suffix: ".supabase.co".into(),
            upstream: UpstreamSettings {
                max_redirects: 0,
                ..UpstreamSettings::default()
            },
        };
        let report = format_validation_report("imgrelay.yaml", &config);
        assert!(report.starts_with("imgrelay.yaml is valid"));
        assert!(report.contains("redirects:      disabled"));
    }
}

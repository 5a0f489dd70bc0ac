//! Serde data structures for the imgrelay configuration file.
//!
//! Contains [`Config`] (the root) and [`UpstreamSettings`]. Both derive
//! `Serialize` and `Deserialize` with `deny_unknown_fields` for strict
//! parsing; every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ALLOWED_SUFFIX: &str = ".supabase.co";

fn default_allowed_suffix() -> String {
    DEFAULT_ALLOWED_SUFFIX.to_string()
}

const fn default_timeout() -> u64 {
    10_000
}

const fn default_max_redirects() -> u8 {
    5
}

const fn default_max_body() -> usize {
    20 * 1024 * 1024
}

fn is_default_timeout(v: &u64) -> bool {
    *v == default_timeout()
}

fn is_default_max_redirects(v: &u8) -> bool {
    *v == default_max_redirects()
}

fn is_default_max_body(v: &usize) -> bool {
    *v == default_max_body()
}

fn is_default_upstream(v: &UpstreamSettings) -> bool {
    is_default_timeout(&v.timeout)
        && is_default_max_redirects(&v.max_redirects)
        && is_default_max_body(&v.max_body)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Hostname ending every proxied URL must carry.
    #[serde(default = "default_allowed_suffix")]
    pub allowed_suffix: String,

    #[serde(default, skip_serializing_if = "is_default_upstream")]
    pub upstream: UpstreamSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allowed_suffix: default_allowed_suffix(),
            upstream: UpstreamSettings::default(),
        }
    }
}

impl Config {
    /// Lowercase the suffix so it compares against `url`'s normalised hosts.
    pub fn normalize(&mut self) {
        self.allowed_suffix = self.allowed_suffix.trim().to_ascii_lowercase();
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamSettings {
    /// Whole-exchange budget in milliseconds, redirects and body included.
    #[serde(
        default = "default_timeout",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout: u64,

    #[serde(
        default = "default_max_redirects",
        skip_serializing_if = "is_default_max_redirects"
    )]
    pub max_redirects: u8,

    #[serde(
        default = "default_max_body",
        skip_serializing_if = "is_default_max_body"
    )]
    pub max_body: usize,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_redirects: default_max_redirects(),
            max_body: default_max_body(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.allowed_suffix, ".supabase.co");
        assert_eq!(config.upstream.timeout, 10_000);
        assert_eq!(config.upstream.max_redirects, 5);
        assert_eq!(config.upstream.max_body, 20 * 1024 * 1024);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<Config>(r#"{"allowed_domain": ".x.com"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn normalize_lowercases_and_trims() {
        let mut config = Config {
            allowed_suffix: "  .Storage.Example.COM ".into(),
            ..Config::default()
        };
        config.normalize();
        assert_eq!(config.allowed_suffix, ".storage.example.com");
    }

    #[test]
    fn default_upstream_is_not_serialized() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert_eq!(json, r#"{"allowed_suffix":".supabase.co"}"#);
    }
}

//! Configuration loading and validation.
//!
//! Resolves where the config comes from (explicit path, auto-detected
//! file, or built-in defaults), parses it by file extension, validates
//! it, and tags it with a [`ConfigVersion`] so `/health` can report
//! exactly which config a running instance uses.

pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::RelayError;
use model::Config;
use validation::validate;

/// File names probed in the working directory when no path is given.
pub const CONFIG_CANDIDATES: &[&str] = &[
    "imgrelay.yaml",
    "imgrelay.yml",
    "imgrelay.json",
    "imgrelay.toml",
];

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigVersion {
    Hash(String),
    Defaults,
}

impl ConfigVersion {
    /// Short form for display: first 8 hex chars of the hash.
    #[must_use]
    pub fn short(&self) -> String {
        match self {
            Self::Hash(h) => h.get(..8).unwrap_or(h).to_string(),
            Self::Defaults => "defaults".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    pub version: ConfigVersion,
    pub source_name: String,
}

/// Parse a config string based on file extension.
pub fn parse_config_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<Config, RelayError> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| RelayError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| RelayError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| RelayError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(RelayError::UnsupportedFormat(other.to_string())),
    }
}

/// Compute a lowercase hex-encoded SHA-256 digest.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Read, parse, normalise, validate, and hash a config file.
pub async fn load_file(path: &Path) -> Result<(Config, ConfigVersion), RelayError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RelayError::ConfigFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RelayError::Io(e)
        }
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let mut config = parse_config_str(ext, &content, &path.display().to_string())?;
    config.normalize();

    if let Err(errors) = validate(&config) {
        return Err(RelayError::ConfigValidation { errors });
    }

    Ok((config, ConfigVersion::Hash(sha256_hex(content.as_bytes()))))
}

/// Pick the config file to load: the explicit path, else the first
/// auto-detected candidate in the working directory, else none.
pub async fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    for name in CONFIG_CANDIDATES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return Some(path);
        }
    }

    None
}

/// Load the effective config: a file when one is found, defaults otherwise.
pub async fn load(explicit: Option<&Path>) -> Result<LoadedConfig, RelayError> {
    match resolve_config_path(explicit).await {
        Some(path) => {
            let (config, version) = load_file(&path).await?;
            Ok(LoadedConfig {
                config,
                version,
                source_name: path.display().to_string(),
            })
        }
        None => {
            tracing::info!("no config file found, using built-in defaults");
            Ok(LoadedConfig {
                config: Config::default(),
                version: ConfigVersion::Defaults,
                source_name: "defaults".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_lowercase_hex() {
        let hash = sha256_hex(b"allowed_suffix: .supabase.co\n");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn short_version_truncates_hash() {
        let version = ConfigVersion::Hash("0123456789abcdef".into());
        assert_eq!(version.short(), "01234567");
        assert_eq!(ConfigVersion::Defaults.short(), "defaults");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = parse_config_str("xml", "<config/>", "imgrelay.xml").unwrap_err();
        assert!(matches!(err, RelayError::UnsupportedFormat(ref ext) if ext == "xml"));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_parses_nested_upstream() {
        let yaml = "allowed_suffix: .cdn.example.com\nupstream:\n  timeout: 2500\n  max_redirects: 0\n";
        let config = parse_config_str("yaml", yaml, "imgrelay.yaml").unwrap();
        assert_eq!(config.allowed_suffix, ".cdn.example.com");
        assert_eq!(config.upstream.timeout, 2500);
        assert_eq!(config.upstream.max_redirects, 0);
    }

    #[tokio::test]
    async fn explicit_missing_file_reports_not_found() {
        let path = std::env::temp_dir().join(format!("imgrelay-missing-{}.yaml", uuid::Uuid::new_v4()));
        let err = load(Some(&path)).await.unwrap_err();
        assert!(matches!(err, RelayError::ConfigFileNotFound { .. }));
    }
}

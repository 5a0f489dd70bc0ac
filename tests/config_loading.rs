//! Integration tests for config loading from files.

use std::path::PathBuf;

use imgrelay::config::model::Config;
use imgrelay::config::validation::validate;
use imgrelay::config::{self, ConfigVersion};
use imgrelay::error::RelayError;

struct TempConfig(PathBuf);

impl TempConfig {
    fn new(ext: &str, content: &str) -> Self {
        let path = std::env::temp_dir().join(format!("imgrelay-{}.{ext}", uuid::Uuid::new_v4()));
        std::fs::write(&path, content).unwrap();
        Self(path)
    }
}

impl Drop for TempConfig {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[cfg(feature = "yaml")]
#[tokio::test]
async fn yaml_file_loads_normalises_and_hashes() {
    let content = "allowed_suffix: .Storage.Example.com\nupstream:\n  timeout: 3000\n";
    let file = TempConfig::new("yaml", content);

    let (config, version) = config::load_file(&file.0).await.unwrap();
    assert_eq!(config.allowed_suffix, ".storage.example.com");
    assert_eq!(config.upstream.timeout, 3000);
    assert_eq!(config.upstream.max_redirects, 5);
    assert_eq!(
        version,
        ConfigVersion::Hash(config::sha256_hex(content.as_bytes()))
    );
}

#[cfg(feature = "yaml")]
#[tokio::test]
async fn explicit_path_is_reported_as_source() {
    let file = TempConfig::new("yml", "allowed_suffix: .supabase.co\n");

    let loaded = config::load(Some(&file.0)).await.unwrap();
    assert_eq!(loaded.source_name, file.0.display().to_string());
    assert!(matches!(loaded.version, ConfigVersion::Hash(_)));
}

#[cfg(feature = "yaml")]
#[tokio::test]
async fn invalid_values_fail_validation() {
    let file = TempConfig::new("yaml", "allowed_suffix: \"\"\nupstream:\n  timeout: 0\n");

    let err = config::load_file(&file.0).await.unwrap_err();
    let RelayError::ConfigValidation { errors } = err else {
        panic!("expected validation error");
    };
    assert_eq!(errors.len(), 2);
}

#[cfg(feature = "yaml")]
#[tokio::test]
async fn unknown_keys_are_parse_errors() {
    let file = TempConfig::new("yaml", "allowed_domains: [.supabase.co]\n");

    let err = config::load_file(&file.0).await.unwrap_err();
    assert!(matches!(err, RelayError::ConfigParse { .. }));
}

#[cfg(feature = "json")]
#[tokio::test]
async fn json_file_loads() {
    let file = TempConfig::new(
        "json",
        r#"{"allowed_suffix": ".cdn.example.com", "upstream": {"max_redirects": 0}}"#,
    );

    let (config, _) = config::load_file(&file.0).await.unwrap();
    assert_eq!(config.allowed_suffix, ".cdn.example.com");
    assert_eq!(config.upstream.max_redirects, 0);
}

#[cfg(feature = "toml")]
#[tokio::test]
async fn toml_file_loads() {
    let file = TempConfig::new(
        "toml",
        "allowed_suffix = \".cdn.example.com\"\n\n[upstream]\nmax_body = 4096\n",
    );

    let (config, _) = config::load_file(&file.0).await.unwrap();
    assert_eq!(config.upstream.max_body, 4096);
}

#[tokio::test]
async fn unsupported_extension_is_rejected() {
    let file = TempConfig::new("ini", "allowed_suffix = .supabase.co\n");

    let err = config::load_file(&file.0).await.unwrap_err();
    assert!(matches!(err, RelayError::UnsupportedFormat(ref ext) if ext == "ini"));
}

#[test]
fn defaults_are_sensible() {
    let config = Config::default();
    assert_eq!(config.allowed_suffix, ".supabase.co");
    assert_eq!(config.upstream.timeout, 10_000);
    assert_eq!(config.upstream.max_redirects, 5);
    validate(&config).unwrap();
}

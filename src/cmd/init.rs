//! `imgrelay init` — generate a starter configuration file.
//!
//! Writes a YAML, JSON, or TOML config with either the minimal or the
//! fully documented template. Never overwrites an existing file.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::RelayError;

pub fn execute(args: &InitArgs) -> Result<(), RelayError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("imgrelay.{}", args.format.extension())));

    if output.exists() {
        return Err(RelayError::FileExists { path: output });
    }

    std::fs::write(&output, template(&args.format, args.full))?;
    println!("Created {}", output.display());
    Ok(())
}

#[must_use]
pub const fn template(format: &ConfigFormat, full: bool) -> &'static str {
    match (format, full) {
        (ConfigFormat::Yaml, false) => YAML_MINIMAL,
        (ConfigFormat::Yaml, true) => YAML_FULL,
        (ConfigFormat::Json, false) => JSON_MINIMAL,
        (ConfigFormat::Json, true) => JSON_FULL,
        (ConfigFormat::Toml, false) => TOML_MINIMAL,
        (ConfigFormat::Toml, true) => TOML_FULL,
    }
}

const YAML_MINIMAL: &str = r#"# imgrelay config

# Only URLs whose hostname ends with this suffix are proxied.
allowed_suffix: ".supabase.co"
"#;

const YAML_FULL: &str = r#"# imgrelay config
#
# All values shown are defaults.

# Only URLs whose hostname ends with this suffix are proxied.
# Keep the leading dot: "supabase.co" would also match "evilsupabase.co".
allowed_suffix: ".supabase.co"

upstream:
  timeout: 10000        # Whole upstream exchange in ms, redirects included
  max_redirects: 5      # 0 disables following; each hop must match allowed_suffix
  max_body: 20971520    # Largest image accepted, in bytes
"#;

const JSON_MINIMAL: &str = r#"{
  "allowed_suffix": ".supabase.co"
}
"#;

const JSON_FULL: &str = r#"{
  "allowed_suffix": ".supabase.co",
  "upstream": {
    "timeout": 10000,
    "max_redirects": 5,
    "max_body": 20971520
  }
}
"#;

const TOML_MINIMAL: &str = r#"# imgrelay config

# Only URLs whose hostname ends with this suffix are proxied.
allowed_suffix = ".supabase.co"
"#;

const TOML_FULL: &str = r#"# imgrelay config
#
# All values shown are defaults.

# Only URLs whose hostname ends with this suffix are proxied.
# Keep the leading dot: "supabase.co" would also match "evilsupabase.co".
allowed_suffix = ".supabase.co"

[upstream]
timeout = 10000        # Whole upstream exchange in ms, redirects included
max_redirects = 5      # 0 disables following; each hop must match allowed_suffix
max_body = 20971520    # Largest image accepted, in bytes
"#;

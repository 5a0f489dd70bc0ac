//! `imgrelay run` — start the proxy server.
//!
//! Loads configuration (file or defaults), applies CLI / env overrides,
//! and serves the Axum router until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::{self, validation, ConfigVersion, LoadedConfig};
use crate::error::RelayError;
use crate::logging;
use crate::proxy::IMAGE_PROXY_PATH;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), RelayError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let loaded = config::load(args.config.as_deref()).await?;
    let loaded = apply_overrides(loaded, &args)?;

    tracing::info!(
        source = %loaded.source_name,
        version = %loaded.version.short(),
        allowed_suffix = %loaded.config.allowed_suffix,
        timeout_ms = loaded.config.upstream.timeout,
        max_redirects = loaded.config.upstream.max_redirects,
        "config loaded"
    );

    let state = Arc::new(AppState::new(loaded));
    let router = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, path = IMAGE_PROXY_PATH, "imgrelay started");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal())
    .await?;

    tracing::info!("imgrelay stopped");
    Ok(())
}

/// Layer CLI / env values over the loaded config and re-validate the result.
pub fn apply_overrides(mut loaded: LoadedConfig, args: &RunArgs) -> Result<LoadedConfig, RelayError> {
    let mut overridden = false;

    if let Some(ref suffix) = args.allowed_suffix {
        loaded.config.allowed_suffix.clone_from(suffix);
        overridden = true;
    }
    if let Some(timeout) = args.timeout {
        loaded.config.upstream.timeout = timeout;
        overridden = true;
    }

    if overridden {
        loaded.config.normalize();
        if let Err(errors) = validation::validate(&loaded.config) {
            return Err(RelayError::ConfigValidation { errors });
        }
        if loaded.version == ConfigVersion::Defaults {
            loaded.source_name = "defaults+cli".to_string();
        } else {
            loaded.source_name.push_str("+cli");
        }
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::config::model::Config;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["imgrelay", "run"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Commands::Run(args)) => *args,
            _ => panic!("expected run subcommand"),
        }
    }

    fn defaults() -> LoadedConfig {
        LoadedConfig {
            config: Config::default(),
            version: ConfigVersion::Defaults,
            source_name: "defaults".into(),
        }
    }

    #[test]
    fn suffix_override_is_normalised() {
        let args = run_args(&["--allowed-suffix", ".CDN.Example.com", "--timeout", "1500"]);
        let loaded = apply_overrides(defaults(), &args).unwrap();
        assert_eq!(loaded.config.allowed_suffix, ".cdn.example.com");
        assert_eq!(loaded.config.upstream.timeout, 1500);
        assert_eq!(loaded.source_name, "defaults+cli");
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = run_args(&["--allowed-suffix", "https://x.supabase.co/"]);
        let err = apply_overrides(defaults(), &args).unwrap_err();
        assert!(matches!(err, RelayError::ConfigValidation { .. }));
    }

    #[test]
    fn zero_timeout_override_is_rejected() {
        let args = run_args(&["--timeout", "0"]);
        assert!(apply_overrides(defaults(), &args).is_err());
    }
}

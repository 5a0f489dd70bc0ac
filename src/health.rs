//! `GET /health` endpoint handler.
//!
//! Returns a [`HealthResponse`] JSON payload with the server version,
//! build metadata, uptime, the active config, and cumulative request
//! counters.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub build: BuildInfo,
    pub config: ConfigHealth,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct BuildInfo {
    pub git: String,
    pub profile: String,
}

#[derive(Serialize, Deserialize)]
pub struct ConfigHealth {
    pub source: String,
    pub version: String,
    pub allowed_suffix: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub images_proxied: u64,
    pub requests_rejected: u64,
    pub upstream_failures: u64,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        build: BuildInfo {
            git: env!("IMGRELAY_GIT_SHORT").to_string(),
            profile: env!("IMGRELAY_BUILD_PROFILE").to_string(),
        },
        config: ConfigHealth {
            source: state.config_source.clone(),
            version: state.config_version.short(),
            allowed_suffix: state.config.allowed_suffix.clone(),
        },
        stats: StatsResponse {
            images_proxied: state.stats.proxied.load(Ordering::Relaxed),
            requests_rejected: state.stats.rejected.load(Ordering::Relaxed),
            upstream_failures: state.stats.failed.load(Ordering::Relaxed),
        },
    })
}

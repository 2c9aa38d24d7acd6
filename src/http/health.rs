//! Liveness endpoints.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub timestamp: u64,
    /// False when the allowlist is empty and every target will be rejected.
    pub proxy_configured: bool,
}

/// `GET /health`: unauthenticated, outside the rate-limited mount.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
        proxy_configured: !state.allowlist.snapshot().is_empty(),
    })
}

/// `GET /`: plain-text banner for eyeball checks.
pub async fn root_banner() -> String {
    format!("crossgate v{} ready", env!("CARGO_PKG_VERSION"))
}

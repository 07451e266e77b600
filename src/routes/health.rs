//! Health check endpoints
//!
//! Provides endpoints for monitoring and container orchestration:
//! - `/health` - Health check with configuration status
//! - `/health/live` - Liveness probe

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::{config::Config, AppState};

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Upstream configuration check
#[derive(Debug, Serialize)]
pub struct UpstreamCheck {
    pub status: HealthStatus,
    pub provider: String,
    pub base_url: String,
    pub server_key_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Dependency checks collection
#[derive(Debug, Serialize)]
pub struct DependencyChecks {
    pub upstream: UpstreamCheck,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub checks: DependencyChecks,
}

/// Simple health response for liveness
#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

/// Check that some request could carry an upstream credential
///
/// With no server key and caller keys refused, every upstream call would be
/// anonymous.
fn check_upstream(config: &Config, provider: &str) -> UpstreamCheck {
    let server_key_configured = config.openai_api_key.is_some();
    let unusable = !server_key_configured && config.hide_user_api_key;

    UpstreamCheck {
        status: if unusable {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        },
        provider: provider.to_string(),
        base_url: config.base_url.clone(),
        server_key_configured,
        error: unusable
            .then(|| "no server API key and user API keys are disabled".to_string()),
    }
}

/// Full health check endpoint
///
/// Returns overall status, version info, uptime, and the upstream check.
/// Degraded still answers 200 so the process isn't restarted for a
/// configuration problem.
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let upstream = check_upstream(&state.config, state.upstream.name());

    let response = HealthResponse {
        status: upstream.status.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        checks: DependencyChecks { upstream },
    };

    (StatusCode::OK, Json(response))
}

/// Liveness probe endpoint
pub async fn liveness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}

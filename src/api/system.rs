//! System endpoints: status and health probes.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;
use tracing::warn;

use super::{
    ApiResponse, AppState, HealthLiveResponse, HealthReadinessChecks, HealthReadyResponse,
    SystemStatus,
};
use crate::domain::UserId;
use crate::state::SharedState;

/// `GET /api/system/status`
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<SystemStatus>> {
    let config = state.config().read().await;

    Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        cache_backend: state.cache().backend().to_string(),
        cache_ttl_seconds: config.cache.ttl_seconds,
        cache_relationships: config.cache.cache_relationships,
    }))
}

/// `GET /health/live`
pub async fn health_live() -> Json<HealthLiveResponse> {
    Json(HealthLiveResponse { status: "ok" })
}

/// `GET /health/ready`
///
/// Responds 503 when upstream cannot be reached.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let checks = run_checks(&state.shared).await;
    let ready = checks.upstream;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(HealthReadyResponse { ready, checks }))
}

/// Probes upstream with a single-user lookup and the cache store with a ping.
/// Neither probe goes through the resolver, so nothing gets cached.
pub async fn run_checks(shared: &SharedState) -> HealthReadinessChecks {
    let (upstream, cache) = tokio::join!(
        shared.upstream.user(UserId::new(1)),
        shared.cache.ping()
    );

    if let Err(e) = &upstream {
        warn!("Upstream check failed: {}", e);
    }
    if let Err(e) = &cache {
        warn!("Cache check failed: {}", e);
    }

    HealthReadinessChecks {
        upstream: upstream.is_ok(),
        cache: cache.is_ok(),
    }
}

//! Health endpoint.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::AppState;
use crate::models::HealthResponse;

/// `GET /api/health`: version plus store and cache reachability.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_connected = match state.resolver.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("store health check failed: {e}");
            false
        }
    };
    let cache_connected = match state.resolver.cache().ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("cache health check failed: {e}");
            false
        }
    };

    let status = if store_connected && cache_connected {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.into(),
        version: attendify_core::version().into(),
        service: state.resolver.service().into(),
        store_connected,
        cache_connected,
    })
}

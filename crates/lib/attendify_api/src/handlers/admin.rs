//! Admin request handlers.

use axum::Json;
use axum::extract::State;
use tracing::info;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ApiResponse;

/// `DELETE /admin/cache`: flush every cached entry. Requires role `admin`.
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<()>>> {
    state.resolver.cache().clear_all().await?;
    info!(user_id = %user.id(), "cache cleared");
    Ok(Json(ApiResponse::message("Cache cleared")))
}

//! User request handlers.

use axum::Json;
use axum::extract::{Path, State};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{ApiResponse, UserResponse};

/// `GET /users/{id}`: a user with their expanded grants. Requires `read:users`.
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let principal = state
        .resolver
        .store()
        .find_by_id(&id)
        .await?
        .filter(|p| !p.is_deleted())
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
    Ok(Json(ApiResponse::ok(
        "User retrieved",
        UserResponse::from(&principal),
    )))
}

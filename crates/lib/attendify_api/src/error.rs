//! Application error types.

use attendify_core::auth::AuthError;
use attendify_core::auth::store::StoreError;
use attendify_core::cache::CacheError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Details are logged, never sent to the client.
    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Auth failures carry a generic summary in `message` and the reason in
        // `error`; everything else carries the text in `message`.
        let (status, message, error) = match self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, m, "validation_error".to_string()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m, "not_found".to_string()),
            AppError::Unauthorized(reason) => (
                StatusCode::UNAUTHORIZED,
                "Authorization failed!".to_string(),
                reason,
            ),
            AppError::Forbidden(reason) => (
                StatusCode::FORBIDDEN,
                format!("Forbidden: {}", reason.to_lowercase()),
                reason,
            ),
            AppError::Internal(detail) => {
                error!("internal error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "internal_error".to_string(),
                )
            }
        };
        let body = Json(ErrorResponse {
            success: false,
            message,
            error,
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        if e.is_unauthenticated() {
            AppError::Unauthorized(e.to_string())
        } else if e.is_forbidden() {
            AppError::Forbidden(e.to_string())
        } else {
            AppError::Internal(e.to_string())
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        AppError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendify_core::auth::keys::KeyStoreError;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn authentication_failures_put_reason_in_error() {
        let resp = AppError::from(AuthError::MissingToken).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Authorization failed!");
        assert_eq!(json["error"], "No token provided");
    }

    #[tokio::test]
    async fn provider_message_is_passed_through() {
        let resp = AppError::from(AuthError::Provisioning("Token revoked".into())).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"], "Token revoked");
    }

    #[tokio::test]
    async fn authorization_failures_are_403() {
        let resp = AppError::from(AuthError::InsufficientRole).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "Forbidden: insufficient role");
        assert_eq!(json["error"], "Insufficient role");
    }

    #[tokio::test]
    async fn validation_text_stays_in_message() {
        let resp = AppError::Validation("Email and password are required".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "Email and password are required");
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn key_errors_are_opaque_500s() {
        let err = AuthError::KeyError(KeyStoreError::InvalidService("../etc".into()));
        let resp = AppError::from(err).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "Internal server error");
        assert_eq!(json["error"], "internal_error");
        assert!(!json.to_string().contains("../etc"));
    }
}

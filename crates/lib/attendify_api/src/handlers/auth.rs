//! Authentication request handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ApiResponse, LoginRequest, RefreshRequest, SessionData, UserResponse};
use crate::services::auth::{self, Session};
use crate::services::cookies::{
    ACCESS_COOKIE, REFRESH_COOKIE, access_cookie, clear_cookie, refresh_cookie,
};

/// `POST /auth/login`: authenticate with email and password through the
/// identity provider.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, Json<ApiResponse<SessionData>>)> {
    let required = || AppError::Validation("Email and password are required".into());
    // Any body that is not a JSON object with both fields, including none at
    // all, is the same validation failure.
    let body: LoginRequest = serde_json::from_slice(&body).map_err(|_| required())?;
    let (Some(email), Some(password)) = (
        body.email.filter(|e| !e.is_empty()),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(required());
    };

    let session = auth::login(&state.resolver, &email, &password).await?;
    Ok(respond(&state, jar, session, "Login successful"))
}

/// `POST /auth/refresh`: exchange a refresh token (body or cookie) for a new
/// token pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, Json<ApiResponse<SessionData>>)> {
    let from_body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?
            .refresh_token
    };
    let token = from_body
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;

    let session = auth::refresh(&state.resolver, &token).await?;
    Ok(respond(&state, jar, session, "Token refreshed"))
}

/// `POST /auth/logout`: forget the cached principal and clear both cookies.
pub async fn logout_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    state.resolver.forget(user.id()).await;
    let settings = state.config.cookie_settings();
    let jar = jar
        .add(clear_cookie(&settings, ACCESS_COOKIE))
        .add(clear_cookie(&settings, REFRESH_COOKIE));
    (jar, Json(ApiResponse::message("Logout successful")))
}

/// `GET /auth/me`: the authenticated principal.
pub async fn me_handler(user: AuthenticatedUser) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::ok(
        "User retrieved",
        UserResponse::from(user.principal()),
    ))
}

fn respond(
    state: &AppState,
    jar: CookieJar,
    session: Session,
    message: &str,
) -> (CookieJar, Json<ApiResponse<SessionData>>) {
    let settings = state.config.cookie_settings();
    let jar = jar
        .add(access_cookie(&settings, &session.access_token))
        .add(refresh_cookie(&settings, &session.refresh_token));
    let data = SessionData {
        user: UserResponse::from(&session.principal),
        access_token: session.access_token,
        refresh_token: session.refresh_token,
    };
    (jar, Json(ApiResponse::ok(message, data)))
}

//! Authentication middleware: token extraction and principal resolution.

use attendify_core::models::auth::Principal;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::ACCESS_COOKIE;

/// The principal attached to a request by [`require_auth`].
///
/// Has no public constructor, so a value in request extensions always comes
/// from a successful authentication.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(Principal);

impl AuthenticatedUser {
    pub fn principal(&self) -> &Principal {
        &self.0
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))
    }
}

/// Bearer token from the `Authorization` header, else the access cookie.
///
/// A `Bearer` header is the only source when present, so an empty one reads
/// as no token even if the cookie is set.
pub fn extract_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match bearer {
        Some(token) => Some(token.trim().to_string()).filter(|t| !t.is_empty()),
        None => jar
            .get(ACCESS_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty()),
    }
}

/// Axum middleware: resolves the request's token to a principal and injects
/// [`AuthenticatedUser`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers(), &jar);
    let principal = state.resolver.authenticate(token.as_deref()).await?;
    debug!(user_id = %principal.id, "request authenticated");

    request
        .extensions_mut()
        .insert(AuthenticatedUser(principal));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    fn jar_with(token: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(ACCESS_COOKIE, token.to_string()))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn header_wins_over_cookie() {
        let token = extract_token(&bearer("from-header"), &jar_with("from-cookie"));
        assert_eq!(token.as_deref(), Some("from-header"));
    }

    #[test]
    fn cookie_is_used_without_header() {
        let token = extract_token(&HeaderMap::new(), &jar_with("from-cookie"));
        assert_eq!(token.as_deref(), Some("from-cookie"));
    }

    #[test]
    fn non_bearer_scheme_falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(
            extract_token(&headers, &jar_with("c")).as_deref(),
            Some("c")
        );
        assert_eq!(extract_token(&headers, &CookieJar::new()), None);
    }

    #[test]
    fn empty_bearer_does_not_fall_back_to_cookie() {
        assert_eq!(extract_token(&bearer(""), &jar_with("from-cookie")), None);
    }

    #[test]
    fn empty_values_count_as_missing() {
        assert_eq!(extract_token(&bearer(""), &jar_with("")), None);
    }
}

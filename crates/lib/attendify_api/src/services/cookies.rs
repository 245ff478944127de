//! Cookie service: set and clear the HTTP-only auth cookies.
//!
//! Names are `accessToken` and `refreshToken`. Lifetimes follow the token
//! lifetimes so the browser drops a cookie when its token expires.

use attendify_core::auth::jwt::{ACCESS_TOKEN_EXPIRY_SECS, REFRESH_TOKEN_EXPIRY_SECS};
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Attributes shared by every auth cookie.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub domain: String,
    /// Set in production.
    pub secure: bool,
}

/// HTTP-only cookie carrying the access token.
pub fn access_cookie(settings: &CookieSettings, token: &str) -> Cookie<'static> {
    build(
        settings,
        ACCESS_COOKIE,
        token,
        Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS),
    )
}

/// HTTP-only cookie carrying the refresh token.
pub fn refresh_cookie(settings: &CookieSettings, token: &str) -> Cookie<'static> {
    build(
        settings,
        REFRESH_COOKIE,
        token,
        Duration::seconds(REFRESH_TOKEN_EXPIRY_SECS),
    )
}

/// Expired cookie that clears `name` in the browser.
pub fn clear_cookie(settings: &CookieSettings, name: &'static str) -> Cookie<'static> {
    build(settings, name, "", Duration::ZERO)
}

fn build(
    settings: &CookieSettings,
    name: &'static str,
    value: &str,
    max_age: Duration,
) -> Cookie<'static> {
    Cookie::build((name, value.to_string()))
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Strict)
        .domain(settings.domain.clone())
        .path("/")
        .max_age(max_age)
        .build()
}

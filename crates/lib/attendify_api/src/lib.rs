//! # attendify_api
//!
//! HTTP API library for the Attendify auth gateway.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use attendify_core::auth::permissions;
use attendify_core::auth::resolver::IdentityResolver;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{admin, auth, health, users};
use crate::middleware::auth::require_auth;
use crate::middleware::guard::{enforce, require_permission, require_role};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Token verification, principal lookup and the cache handle.
    pub resolver: IdentityResolver,
}

/// Run embedded database migrations.
///
/// Delegates to `attendify_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    attendify_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_API_HEALTH, get(health::health_handler))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::POST_AUTH_REFRESH, post(auth::refresh_handler));

    let user_routes = Router::new()
        .route(routes::GET_USERS_ID, get(users::get_user_handler))
        .route_layer(from_fn_with_state(
            require_permission(&state, permissions::READ_USERS),
            enforce,
        ));

    let admin_routes = Router::new()
        .route(routes::DELETE_ADMIN_CACHE, delete(admin::clear_cache_handler))
        .route_layer(from_fn_with_state(
            require_role(&state, permissions::ADMIN_ROLE),
            enforce,
        ));

    // Protected routes (require auth). Guards sit inside the auth layer.
    let protected = Router::new()
        .route(routes::GET_AUTH_ME, get(auth::me_handler))
        .route(routes::POST_AUTH_LOGOUT, post(auth::logout_handler))
        .merge(user_routes)
        .merge(admin_routes)
        .layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

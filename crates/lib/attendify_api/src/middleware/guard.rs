//! Role and permission guards.
//!
//! ```ignore
//! Router::new()
//!     .route(routes::GET_USERS_ID, get(users::get_user_handler))
//!     .route_layer(from_fn_with_state(
//!         require_permission(&state, permissions::READ_USERS),
//!         enforce,
//!     ))
//! ```
//!
//! Must run inside [`super::auth::require_auth`].

use attendify_core::auth::guard::Requirement;
use attendify_core::auth::resolver::IdentityResolver;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::auth::AuthenticatedUser;
use crate::AppState;
use crate::error::AppError;

/// Middleware state for [`enforce`]: what to require and where to load grants.
#[derive(Clone)]
pub struct Guard {
    resolver: IdentityResolver,
    requirement: Requirement,
}

impl Guard {
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }
}

/// Guard requiring `permission`.
pub fn require_permission(state: &AppState, permission: &str) -> Guard {
    Guard {
        resolver: state.resolver.clone(),
        requirement: Requirement::permission(permission),
    }
}

/// Guard requiring `role`.
pub fn require_role(state: &AppState, role: &str) -> Guard {
    Guard {
        resolver: state.resolver.clone(),
        requirement: Requirement::role(role),
    }
}

/// Axum middleware: reloads the authenticated user's grants and checks the
/// guard's requirement against them.
pub async fn enforce(
    State(guard): State<Guard>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.id().to_string())
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    let principal = guard.resolver.grants_for(&user_id).await?;
    if let Err(e) = guard.requirement.check(&principal) {
        debug!(user_id = %user_id, requirement = %guard.requirement, "access denied");
        return Err(e.into());
    }

    Ok(next.run(request).await)
}

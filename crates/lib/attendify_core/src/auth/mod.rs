//! Authentication and authorization logic.
//!
//! Provides service-scoped key management, JWT handling, principal
//! resolution and role/permission checks that `attendify_api` wires into
//! its middleware chain.

pub mod guard;
pub mod jwt;
pub mod keys;
pub mod permissions;
pub mod principal;
pub mod provider;
pub mod queries;
pub mod resolver;
pub mod store;

use thiserror::Error;

use self::jwt::TokenError;
use self::keys::KeyStoreError;
use self::store::StoreError;

/// Authentication and authorization failures.
///
/// The first group are 401s, the `Insufficient*` pair are 403s and the rest
/// are internal failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid service in token")]
    InvalidService,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    /// Provisioning through the identity provider failed; carries its message.
    #[error("{0}")]
    Provisioning(String),

    #[error("Insufficient permission")]
    InsufficientPermission,

    #[error("Insufficient role")]
    InsufficientRole,

    #[error("Key error: {0}")]
    KeyError(#[from] KeyStoreError),

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

impl AuthError {
    /// Whether this is a 401-class failure.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken
                | AuthError::InvalidService
                | AuthError::InvalidToken
                | AuthError::UserNotFound
                | AuthError::Provisioning(_)
        )
    }

    /// Whether this is a 403-class failure.
    pub fn is_forbidden(&self) -> bool {
        matches!(
            self,
            AuthError::InsufficientPermission | AuthError::InsufficientRole
        )
    }
}

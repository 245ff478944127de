//! Role and permission requirements.
//!
//! Plain set membership against the principal's flattened grants. There is
//! no wildcard or hierarchy: an admin holds exactly the permissions its
//! roles expand to.

use std::fmt;

use super::AuthError;
use crate::models::auth::Principal;

/// A single grant a route requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Permission(String),
    Role(String),
}

impl Requirement {
    pub fn permission(name: impl Into<String>) -> Self {
        Requirement::Permission(name.into())
    }

    pub fn role(name: impl Into<String>) -> Self {
        Requirement::Role(name.into())
    }

    /// `Ok` when the principal holds the grant, a 403-class error otherwise.
    pub fn check(&self, principal: &Principal) -> Result<(), AuthError> {
        match self {
            Requirement::Permission(name) if principal.has_permission(name) => Ok(()),
            Requirement::Permission(_) => Err(AuthError::InsufficientPermission),
            Requirement::Role(name) if principal.has_role(name) => Ok(()),
            Requirement::Role(_) => Err(AuthError::InsufficientRole),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Permission(name) => write!(f, "permission {name}"),
            Requirement::Role(name) => write!(f, "role {name}"),
        }
    }
}

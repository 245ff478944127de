//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API response shapes
//! (which use `camelCase` field names where the frontend expects them).

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated identity with its flattened roles, permissions and groups.
///
/// Never stored as-is: the store keeps users and the role/permission graph in
/// separate tables and [`crate::auth::principal::project_principal`] reduces
/// them to this shape. The same value is cached under `users:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    pub service: String,
}

impl Principal {
    /// Soft-deleted principals must never authenticate.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Permission names as a set; duplicates collapse.
    pub fn permission_set(&self) -> BTreeSet<&str> {
        self.permissions.iter().map(String::as_str).collect()
    }

    /// Role names as a set; duplicates collapse.
    pub fn role_set(&self) -> BTreeSet<&str> {
        self.roles.iter().map(String::as_str).collect()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Audit entry written alongside a newly created user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataLog {
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DataLog {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Input for creating a user record.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Taken from the identity provider (the token's `sub`), never generated
    /// locally when provisioning.
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub data_log: DataLog,
}

impl NewUser {
    /// Seed a user record from an identity-provider profile.
    pub fn from_profile(id: &str, profile: &ProviderProfile, origin: &str) -> Self {
        Self {
            id: id.to_string(),
            email: profile.email.clone(),
            username: profile.username.clone().unwrap_or_default(),
            first_name: profile.first_name.clone().unwrap_or_default(),
            last_name: profile.last_name.clone().unwrap_or_default(),
            data_log: DataLog::new(format!(
                "User created with email: {} from {origin}",
                profile.email
            )),
        }
    }
}

/// Profile returned by the identity provider's `/auth/profile` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    #[serde(default)]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, rename = "firstName", alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(default, rename = "lastName", alias = "last_name")]
    pub last_name: Option<String>,
}

/// Token pair returned by the identity provider's `/auth/login` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    pub access_token: String,
    pub refresh_token: String,
}

/// The `service` claim: a single service name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceClaim {
    One(String),
    Many(Vec<String>),
}

impl ServiceClaim {
    /// Exact-name membership test.
    pub fn contains(&self, service: &str) -> bool {
        match self {
            ServiceClaim::One(name) => name == service,
            ServiceClaim::Many(names) => names.iter().any(|n| n == service),
        }
    }
}

/// JWT claims carried by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: principal ID (standard JWT `sub` claim).
    pub sub: String,
    /// Username at issue time.
    #[serde(default)]
    pub name: Option<String>,
    /// Issuer (backend URL).
    #[serde(default)]
    pub iss: Option<String>,
    /// Issued at (unix timestamp).
    #[serde(default)]
    pub iat: i64,
    /// Expiry (unix timestamp).
    #[serde(default)]
    pub exp: i64,
    /// Service(s) the token was issued for.
    #[serde(default)]
    pub service: Option<ServiceClaim>,
}

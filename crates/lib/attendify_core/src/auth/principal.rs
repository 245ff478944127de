//! Reduction of stored user rows and their role/permission joins to a
//! [`Principal`].
//!
//! Kept free of I/O so the flattening rules can be tested without a store.

use chrono::{DateTime, Utc};

use crate::models::auth::Principal;

/// Base `users` row.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A role assigned to the user together with the permissions it grants.
#[derive(Debug, Clone, Default)]
pub struct RoleGrant {
    pub role: String,
    pub permissions: Vec<String>,
}

/// Everything the store loads for one user before projection.
#[derive(Debug, Clone)]
pub struct PrincipalRows {
    pub user: UserRecord,
    pub roles: Vec<RoleGrant>,
    pub direct_permissions: Vec<String>,
    pub groups: Vec<String>,
}

impl PrincipalRows {
    /// A user with no roles, grants or groups (e.g. just created).
    pub fn bare(user: UserRecord) -> Self {
        Self {
            user,
            roles: Vec::new(),
            direct_permissions: Vec::new(),
            groups: Vec::new(),
        }
    }
}

/// Flatten rows into a principal.
///
/// `permissions` is the union of every role's permissions and the direct
/// grants. Order is first-seen; duplicates are dropped.
pub fn project_principal(rows: PrincipalRows, service: &str) -> Principal {
    let PrincipalRows {
        user,
        roles,
        direct_permissions,
        groups,
    } = rows;

    let mut role_names = Vec::with_capacity(roles.len());
    let mut permissions = Vec::new();
    for grant in roles {
        push_unique(&mut role_names, grant.role);
        for permission in grant.permissions {
            push_unique(&mut permissions, permission);
        }
    }
    for permission in direct_permissions {
        push_unique(&mut permissions, permission);
    }
    let mut group_names = Vec::with_capacity(groups.len());
    for group in groups {
        push_unique(&mut group_names, group);
    }

    Principal {
        id: user.id,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        created_at: user.created_at,
        updated_at: user.updated_at,
        deleted_at: user.deleted_at,
        roles: role_names,
        permissions,
        groups: group_names,
        service: service.to_string(),
    }
}

fn push_unique(into: &mut Vec<String>, value: String) {
    if !into.contains(&value) {
        into.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: "u-1".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn grant(role: &str, permissions: &[&str]) -> RoleGrant {
        RoleGrant {
            role: role.into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn permissions_are_union_of_roles_and_direct_grants() {
        let rows = PrincipalRows {
            user: record(),
            roles: vec![grant("R", &["p1", "p2"])],
            direct_permissions: vec!["p3".into()],
            groups: vec![],
        };
        let p = project_principal(rows, "attendify");
        assert_eq!(p.roles, vec!["R"]);
        assert_eq!(p.permissions, vec!["p1", "p2", "p3"]);
        assert!(p.has_permission("p1"));
        assert!(!p.has_permission("p4"));
        assert_eq!(p.service, "attendify");
    }

    #[test]
    fn overlapping_grants_collapse() {
        let rows = PrincipalRows {
            user: record(),
            roles: vec![grant("editor", &["read:users", "update:users"]), grant("viewer", &["read:users"])],
            direct_permissions: vec!["update:users".into(), "delete:users".into()],
            groups: vec!["north".into(), "north".into()],
        };
        let p = project_principal(rows, "attendify");
        assert_eq!(p.roles, vec!["editor", "viewer"]);
        assert_eq!(p.permissions, vec!["read:users", "update:users", "delete:users"]);
        assert_eq!(p.groups, vec!["north"]);
    }

    #[test]
    fn role_without_permissions_still_counts_as_role() {
        let rows = PrincipalRows {
            user: record(),
            roles: vec![grant("guest", &[])],
            direct_permissions: vec![],
            groups: vec![],
        };
        let p = project_principal(rows, "attendify");
        assert!(p.has_role("guest"));
        assert!(p.permissions.is_empty());
    }

    #[test]
    fn bare_rows_project_to_empty_grants() {
        let p = project_principal(PrincipalRows::bare(record()), "attendify");
        assert!(p.roles.is_empty() && p.permissions.is_empty() && p.groups.is_empty());
        assert!(!p.is_deleted());
    }
}

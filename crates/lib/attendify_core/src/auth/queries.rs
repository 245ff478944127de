//! Auth-related database queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::principal::{PrincipalRows, RoleGrant, UserRecord};
use crate::models::auth::NewUser;

type UserRow = (
    String,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, created_at, updated_at, deleted_at";

fn into_record(row: UserRow) -> UserRecord {
    let (id, username, email, first_name, last_name, created_at, updated_at, deleted_at) = row;
    UserRecord {
        id,
        username,
        email,
        first_name,
        last_name,
        created_at,
        updated_at,
        deleted_at,
    }
}

/// Fetch a user row by ID.
pub async fn find_user_by_id(pool: &PgPool, id: &str) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(into_record))
}

/// Fetch a user row by email.
pub async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(into_record))
}

/// Roles assigned to a user with the permissions each role grants.
pub async fn get_user_role_grants(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<RoleGrant>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT r.name, p.name \
         FROM user_role ur \
         JOIN roles r ON r.id = ur.role_id \
         LEFT JOIN role_permissions rp ON rp.role_id = r.id \
         LEFT JOIN permissions p ON p.id = rp.permission_id \
         WHERE ur.user_id = $1 \
         ORDER BY r.name, p.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut grants: Vec<RoleGrant> = Vec::new();
    for (role, permission) in rows {
        match grants.last_mut() {
            Some(last) if last.role == role => last.permissions.extend(permission),
            _ => grants.push(RoleGrant {
                role,
                permissions: permission.into_iter().collect(),
            }),
        }
    }
    Ok(grants)
}

/// Permissions granted directly to a user, independent of roles.
pub async fn get_user_direct_permissions(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT p.name \
         FROM user_permissions up \
         JOIN permissions p ON p.id = up.permission_id \
         WHERE up.user_id = $1 \
         ORDER BY p.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Names of the groups a user belongs to.
pub async fn get_user_groups(pool: &PgPool, user_id: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT g.name \
         FROM user_group ug \
         JOIN groups g ON g.id = ug.group_id \
         WHERE ug.user_id = $1 \
         ORDER BY g.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Load a user row and all of its joins.
pub async fn load_principal_rows(
    pool: &PgPool,
    user: UserRecord,
) -> Result<PrincipalRows, sqlx::Error> {
    let roles = get_user_role_grants(pool, &user.id).await?;
    let direct_permissions = get_user_direct_permissions(pool, &user.id).await?;
    let groups = get_user_groups(pool, &user.id).await?;
    Ok(PrincipalRows {
        user,
        roles,
        direct_permissions,
        groups,
    })
}

/// Insert a new user, returning the stored row.
pub async fn create_user(pool: &PgPool, new_user: &NewUser) -> Result<UserRecord, sqlx::Error> {
    let data_logs = serde_json::to_value(&new_user.data_log)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (id, email, username, first_name, last_name, data_logs) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&new_user.id)
    .bind(&new_user.email)
    .bind(&new_user.username)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(data_logs)
    .fetch_one(pool)
    .await?;
    Ok(into_record(row))
}

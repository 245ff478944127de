//! Principal persistence.
//!
//! [`UserStore`] is the seam between the authorization core and whatever holds
//! users. [`PgUserStore`] is the PostgreSQL implementation used in production.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use super::principal::{PrincipalRows, project_principal};
use super::queries;
use crate::models::auth::{NewUser, Principal};

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Other(String),
}

/// Lookup and creation of principals, always with roles and permissions expanded.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<Principal, StoreError>;

    /// Cheap reachability check for health reporting.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// PostgreSQL-backed [`UserStore`].
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
    service: String,
}

impl PgUserStore {
    /// `service` is stamped onto every principal this store produces.
    pub fn new(pool: PgPool, service: impl Into<String>) -> Self {
        Self {
            pool,
            service: service.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>, StoreError> {
        let Some(user) = queries::find_user_by_id(&self.pool, id).await? else {
            return Ok(None);
        };
        let rows = queries::load_principal_rows(&self.pool, user).await?;
        Ok(Some(project_principal(rows, &self.service)))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        let Some(user) = queries::find_user_by_email(&self.pool, email).await? else {
            return Ok(None);
        };
        let rows = queries::load_principal_rows(&self.pool, user).await?;
        Ok(Some(project_principal(rows, &self.service)))
    }

    async fn create(&self, user: NewUser) -> Result<Principal, StoreError> {
        let record = queries::create_user(&self.pool, &user).await?;
        Ok(project_principal(PrincipalRows::bare(record), &self.service))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

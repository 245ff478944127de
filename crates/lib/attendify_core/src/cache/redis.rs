//! Redis cache backend.
//!
//! Holds one multiplexed [`ConnectionManager`] shared by every request. The
//! connection is opened lazily on the first operation and reopened on the
//! next operation after [`CacheStore::disconnect`].

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::{CacheError, CacheStore};

/// Redis-backed [`CacheStore`].
pub struct RedisCache {
    client: redis::Client,
    manager: RwLock<Option<ConnectionManager>>,
}

impl RedisCache {
    /// Parse the URL. Does not connect.
    pub fn open(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("invalid Redis URL: {e}")))?;
        Ok(Self {
            client,
            manager: RwLock::new(None),
        })
    }

    /// Whether a connection is currently held.
    pub async fn is_connected(&self) -> bool {
        self.manager.read().await.is_some()
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        if let Some(manager) = self.manager.read().await.as_ref() {
            return Ok(manager.clone());
        }

        let mut guard = self.manager.write().await;
        if let Some(manager) = guard.as_ref() {
            return Ok(manager.clone());
        }
        let manager = self.client.get_connection_manager().await.map_err(|e| {
            error!("failed to connect to Redis: {e}");
            CacheError::Connection(e.to_string())
        })?;
        info!("connected to Redis");
        *guard = Some(manager.clone());
        Ok(manager)
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await.map_err(|e| {
            error!(key, "Redis GET failed: {e}");
            CacheError::Backend(e)
        })?;
        Ok(value)
    }

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        ttl_secs: Option<u64>,
    ) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let result = match ttl_secs {
            Some(ttl) if ttl > 0 => conn.set_ex::<_, _, ()>(key, value, ttl).await,
            _ => conn.set::<_, _, ()>(key, value).await,
        };
        result.map_err(|e| {
            error!(key, "Redis SET failed: {e}");
            CacheError::Backend(e)
        })
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key).await.map_err(|e| {
            error!(key, "Redis DEL failed: {e}");
            CacheError::Backend(e)
        })
    }

    async fn clear_all(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("FLUSHALL")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Redis FLUSHALL failed: {e}");
                CacheError::Backend(e)
            })?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), CacheError> {
        if self.manager.write().await.take().is_some() {
            info!("disconnected from Redis");
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;
        if response == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Connection(format!(
                "unexpected PING response: {response}"
            )))
        }
    }
}

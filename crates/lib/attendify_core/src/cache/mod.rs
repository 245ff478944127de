//! Key/value cache with TTL.
//!
//! Backends implement [`CacheStore`] over JSON strings; [`Cache`] is the
//! cloneable handle the rest of the code holds and adds typed accessors.
//! The cache is advisory: callers treat read errors as a miss and write
//! errors as non-fatal.

pub mod memory;
pub mod redis;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// TTL for cached principals: 10 minutes.
pub const USER_CACHE_TTL_SECS: u64 = 600;

/// Cache key for a principal.
pub fn user_key(user_id: &str) -> String {
    format!("users:{user_id}")
}

/// Cache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Cache backend error: {0}")]
    Backend(#[from] ::redis::RedisError),

    #[error("Cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Backend contract. Values are serialized JSON.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// `ttl_secs` of `None` or `Some(0)` stores without expiry.
    async fn set_raw(&self, key: &str, value: String, ttl_secs: Option<u64>)
    -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn clear_all(&self) -> Result<(), CacheError>;

    async fn disconnect(&self) -> Result<(), CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}

/// Shared cache handle, injected through application state.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    pub fn new(store: impl CacheStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn from_arc(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Read and deserialize a value. A value that no longer matches `T` is an error.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get_raw(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store a value, overwriting any previous one.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: Option<u64>,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.store.set_raw(key, raw, ttl_secs).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await
    }

    pub async fn clear_all(&self) -> Result<(), CacheError> {
        self.store.clear_all().await
    }

    pub async fn disconnect(&self) -> Result<(), CacheError> {
        self.store.disconnect().await
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        self.store.ping().await
    }
}

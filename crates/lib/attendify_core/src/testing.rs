//! Test doubles for the store, cache and identity provider seams.
//!
//! Compiled for this crate's unit tests and, behind the `testing` feature,
//! for downstream integration tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use crate::auth::principal::{PrincipalRows, UserRecord, project_principal};
use crate::auth::provider::{IdentityProvider, ProviderError};
use crate::auth::store::{StoreError, UserStore};
use crate::cache::memory::MemoryCache;
use crate::cache::{CacheError, CacheStore};
use crate::models::auth::{NewUser, Principal, ProviderCredentials, ProviderProfile};

/// Directory holding RSA fixtures for the `attendify` and `ledger` services.
pub fn fixture_keys_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/keys"))
}

/// An active user row.
pub fn user_record(id: &str) -> UserRecord {
    let now = Utc::now();
    UserRecord {
        id: id.to_string(),
        username: format!("{id}-name"),
        email: format!("{id}@example.com"),
        first_name: "Test".into(),
        last_name: "User".into(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

/// An active principal with no grants.
pub fn principal(id: &str) -> Principal {
    project_principal(PrincipalRows::bare(user_record(id)), "attendify")
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// In-memory [`UserStore`] that counts lookups and records creations.
///
/// Ids and emails are unique, as in the PostgreSQL schema.
pub struct MemoryUserStore {
    service: String,
    users: Mutex<HashMap<String, Principal>>,
    find_by_id_calls: AtomicUsize,
    fail_lookups_after: AtomicUsize,
    created: Mutex<Vec<String>>,
}

impl MemoryUserStore {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            users: Mutex::new(HashMap::new()),
            find_by_id_calls: AtomicUsize::new(0),
            fail_lookups_after: AtomicUsize::new(usize::MAX),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn insert(&self, principal: Principal) {
        self.users
            .lock()
            .unwrap()
            .insert(principal.id.clone(), principal);
    }

    /// Let the first `n` `find_by_id` calls through, then fail every one.
    pub fn fail_lookups_after(&self, n: usize) {
        self.fail_lookups_after.store(n, Ordering::SeqCst);
    }

    pub fn find_by_id_calls(&self) -> usize {
        self.find_by_id_calls.load(Ordering::SeqCst)
    }

    /// IDs passed to `create`, in order.
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>, StoreError> {
        let call = self.find_by_id_calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.fail_lookups_after.load(Ordering::SeqCst) {
            return Err(StoreError::Other("connection refused".into()));
        }
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|p| p.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<Principal, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.id) {
            return Err(StoreError::Other(format!("duplicate user id {}", user.id)));
        }
        if users.values().any(|p| p.email == user.email) {
            return Err(StoreError::Other(format!("duplicate email {}", user.email)));
        }
        let now = Utc::now();
        let record = UserRecord {
            id: user.id.clone(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let principal = project_principal(PrincipalRows::bare(record), &self.service);
        users.insert(user.id.clone(), principal.clone());
        self.created.lock().unwrap().push(user.id);
        Ok(principal)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// [`MemoryCache`] wrapper recording every `set` (key, TTL).
#[derive(Default)]
pub struct RecordingCache {
    inner: MemoryCache,
    set_calls: Mutex<Vec<(String, Option<u64>)>>,
    get_calls: AtomicUsize,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value without recording it as a `set` call.
    pub async fn prime<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = serde_json::to_string(value).unwrap();
        self.prime_raw(key, &raw).await;
    }

    pub async fn prime_raw(&self, key: &str, raw: &str) {
        self.inner.set_raw(key, raw.to_string(), None).await.unwrap();
    }

    pub fn set_calls(&self) -> Vec<(String, Option<u64>)> {
        self.set_calls.lock().unwrap().clone()
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for RecordingCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_raw(key).await
    }

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        ttl_secs: Option<u64>,
    ) -> Result<(), CacheError> {
        self.set_calls
            .lock()
            .unwrap()
            .push((key.to_string(), ttl_secs));
        self.inner.set_raw(key, value, ttl_secs).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.delete(key).await
    }

    async fn clear_all(&self) -> Result<(), CacheError> {
        self.inner.clear_all().await
    }

    async fn disconnect(&self) -> Result<(), CacheError> {
        self.inner.disconnect().await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.inner.ping().await
    }
}

/// A cache whose backend is down.
pub struct FailingCache;

impl FailingCache {
    fn offline() -> CacheError {
        CacheError::Connection("cache offline".into())
    }
}

#[async_trait]
impl CacheStore for FailingCache {
    async fn get_raw(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(Self::offline())
    }

    async fn set_raw(
        &self,
        _key: &str,
        _value: String,
        _ttl_secs: Option<u64>,
    ) -> Result<(), CacheError> {
        Err(Self::offline())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(Self::offline())
    }

    async fn clear_all(&self) -> Result<(), CacheError> {
        Err(Self::offline())
    }

    async fn disconnect(&self) -> Result<(), CacheError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Err(Self::offline())
    }
}

// ---------------------------------------------------------------------------
// Identity provider
// ---------------------------------------------------------------------------

/// Scripted [`IdentityProvider`].
pub struct StubIdentityProvider {
    profile: Mutex<Result<ProviderProfile, String>>,
    login: Mutex<Result<ProviderCredentials, String>>,
    profile_calls: AtomicUsize,
    login_calls: AtomicUsize,
}

impl StubIdentityProvider {
    /// Answers profile requests with `provisioned@example.com`; login fails
    /// until [`Self::set_login`] is called.
    pub fn new() -> Self {
        Self {
            profile: Mutex::new(Ok(ProviderProfile {
                id: None,
                email: "provisioned@example.com".into(),
                username: Some("provisioned".into()),
                first_name: Some("Pro".into()),
                last_name: Some("Visioned".into()),
            })),
            login: Mutex::new(Err("Invalid credentials".into())),
            profile_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_profile(&self, profile: ProviderProfile) {
        *self.profile.lock().unwrap() = Ok(profile);
    }

    pub fn fail_profile(&self, message: &str) {
        *self.profile.lock().unwrap() = Err(message.to_string());
    }

    pub fn set_login(&self, credentials: ProviderCredentials) {
        *self.login.lock().unwrap() = Ok(credentials);
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }
}

impl Default for StubIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    async fn profile(&self, _token: &str) -> Result<ProviderProfile, ProviderError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profile
            .lock()
            .unwrap()
            .clone()
            .map_err(ProviderError::Rejected)
    }

    async fn login(
        &self,
        _email: &str,
        _password: &str,
        _service: &str,
    ) -> Result<ProviderCredentials, ProviderError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login
            .lock()
            .unwrap()
            .clone()
            .map_err(ProviderError::Rejected)
    }
}

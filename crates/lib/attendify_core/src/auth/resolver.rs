//! Bearer token → [`Principal`].
//!
//! Steps run strictly in order, each feeding the next: decode the service
//! claim, verify with that service's key, then look the subject up in the
//! cache, the store, and finally the identity provider (first login).

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::AuthError;
use super::jwt::{TokenService, VerifiedClaims};
use super::provider::IdentityProvider;
use super::store::UserStore;
use crate::cache::{Cache, USER_CACHE_TTL_SECS, user_key};
use crate::models::auth::{NewUser, Principal};

/// Resolves tokens and user IDs to principals for one service deployment.
#[derive(Clone)]
pub struct IdentityResolver {
    service: String,
    tokens: TokenService,
    store: Arc<dyn UserStore>,
    cache: Cache,
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityResolver {
    pub fn new(
        service: impl Into<String>,
        tokens: TokenService,
        store: Arc<dyn UserStore>,
        cache: Cache,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            service: service.into(),
            tokens,
            store,
            cache,
            provider,
        }
    }

    /// This deployment's service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Authenticate an access token, provisioning the principal on first login.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Principal, AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let claims = self.verify_access(token)?;
        let user_id = claims.subject();
        let key = user_key(user_id);

        if let Some(principal) = self.cached_principal(&key).await {
            if principal.is_deleted() {
                return Err(AuthError::UserNotFound);
            }
            debug!(user_id, "principal served from cache");
            return Ok(principal);
        }

        match self.store.find_by_id(user_id).await? {
            Some(principal) if principal.is_deleted() => {
                debug!(user_id, "principal is soft-deleted");
                Err(AuthError::UserNotFound)
            }
            Some(principal) => {
                self.remember(&key, &principal).await;
                Ok(principal)
            }
            None => self.provision(token, user_id, &key).await,
        }
    }

    /// Check the service claim, then verify the access token with this
    /// service's public key.
    pub fn verify_access(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        self.check_service(token)?;
        self.tokens
            .verify_access_token(token, &self.service)?
            .ok_or(AuthError::InvalidToken)
    }

    /// Same as [`Self::verify_access`] for refresh tokens.
    pub fn verify_refresh(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        self.check_service(token)?;
        self.tokens
            .verify_refresh_token(token, &self.service)?
            .ok_or(AuthError::InvalidToken)
    }

    /// Current grants for an already authenticated user: cache, else store.
    pub async fn grants_for(&self, user_id: &str) -> Result<Principal, AuthError> {
        let key = user_key(user_id);
        if let Some(principal) = self.cached_principal(&key).await {
            if principal.is_deleted() {
                return Err(AuthError::UserNotFound);
            }
            return Ok(principal);
        }
        let principal = self
            .store
            .find_by_id(user_id)
            .await?
            .filter(|p| !p.is_deleted())
            .ok_or(AuthError::UserNotFound)?;
        self.remember(&key, &principal).await;
        Ok(principal)
    }

    /// Drop the cached principal, e.g. on logout.
    pub async fn forget(&self, user_id: &str) {
        let key = user_key(user_id);
        if let Err(e) = self.cache.delete(&key).await {
            warn!(key, "cache delete failed: {e}");
        }
    }

    fn check_service(&self, token: &str) -> Result<(), AuthError> {
        let unverified = TokenService::decode_token(token).ok_or(AuthError::InvalidService)?;
        if !unverified.is_for_service(&self.service) {
            debug!(service = %self.service, "token issued for another service");
            return Err(AuthError::InvalidService);
        }
        Ok(())
    }

    async fn provision(
        &self,
        token: &str,
        user_id: &str,
        key: &str,
    ) -> Result<Principal, AuthError> {
        info!(user_id, "user not found, provisioning from identity provider");
        let profile = self.provider.profile(token).await.map_err(|e| {
            warn!(user_id, "profile fetch failed: {e}");
            AuthError::Provisioning(e.to_string())
        })?;

        let principal = self
            .store
            .create(NewUser::from_profile(user_id, &profile, "OpenID"))
            .await?;
        info!(user_id, email = %principal.email, "provisioned new user");
        self.remember(key, &principal).await;
        Ok(principal)
    }

    async fn cached_principal(&self, key: &str) -> Option<Principal> {
        match self.cache.get::<Principal>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key, "cache read failed, falling back to store: {e}");
                None
            }
        }
    }

    async fn remember(&self, key: &str, principal: &Principal) {
        if let Err(e) = self
            .cache
            .set(key, principal, Some(USER_CACHE_TTL_SECS))
            .await
        {
            warn!(key, "cache write failed: {e}");
        }
    }
}

//! JWT token generation and verification.
//!
//! Tokens are RS256-signed and scoped to a service: each service signs and
//! verifies with its own key pair from the [`KeyStore`]. Decoding without
//! verification exists only so the caller can check the `service` claim
//! before verifying; the result is an [`UnverifiedClaims`] which cannot be
//! mistaken for a [`VerifiedClaims`].

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use tracing::{debug, warn};

use super::keys::{KeyStore, KeyStoreError, KeyType, TokenType};
use crate::models::auth::{Principal, ServiceClaim, TokenClaims};

/// Access token lifetime: 1 day.
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 24 * 60 * 60;

/// Refresh token lifetime: 15 days.
pub const REFRESH_TOKEN_EXPIRY_SECS: i64 = 15 * 24 * 60 * 60;

/// Token issuing errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Key(#[from] KeyStoreError),

    #[error("jwt encode: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

/// Claims read from a token whose signature has NOT been checked.
///
/// Only good for the service membership check. Never base an authorization
/// decision on it.
#[derive(Debug, Clone)]
pub struct UnverifiedClaims(TokenClaims);

impl UnverifiedClaims {
    pub fn service(&self) -> Option<&ServiceClaim> {
        self.0.service.as_ref()
    }

    /// Whether the `service` claim names `service`.
    pub fn is_for_service(&self, service: &str) -> bool {
        self.service().is_some_and(|claim| claim.contains(service))
    }

    /// The claimed `sub`. Not proof of identity.
    pub fn subject(&self) -> &str {
        &self.0.sub
    }
}

/// Claims from a token whose signature and expiry have been verified.
#[derive(Debug, Clone)]
pub struct VerifiedClaims(TokenClaims);

impl VerifiedClaims {
    /// The principal ID (`sub`).
    pub fn subject(&self) -> &str {
        &self.0.sub
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn issuer(&self) -> Option<&str> {
        self.0.iss.as_deref()
    }

    pub fn issued_at(&self) -> i64 {
        self.0.iat
    }

    pub fn expires_at(&self) -> i64 {
        self.0.exp
    }

    pub fn service(&self) -> Option<&ServiceClaim> {
        self.0.service.as_ref()
    }
}

/// Issues and verifies service-scoped tokens.
#[derive(Debug, Clone)]
pub struct TokenService {
    keys: KeyStore,
    issuer: String,
}

impl TokenService {
    pub fn new(keys: KeyStore, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
        }
    }

    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    /// Sign an access token (RS256, 1 day) with the service's Access-Private key.
    pub fn generate_access_token(
        &self,
        principal: &Principal,
        service: &str,
    ) -> Result<String, TokenError> {
        self.sign(
            principal,
            service,
            TokenType::Access,
            Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS),
        )
    }

    /// Sign a refresh token (RS256, 15 days) with the service's Refresh-Private key.
    pub fn generate_refresh_token(
        &self,
        principal: &Principal,
        service: &str,
    ) -> Result<String, TokenError> {
        self.sign(
            principal,
            service,
            TokenType::Refresh,
            Duration::seconds(REFRESH_TOKEN_EXPIRY_SECS),
        )
    }

    /// Verify an access token against the service's Access-Public key.
    ///
    /// `Ok(None)` for every validation failure (bad signature, expired,
    /// malformed). `Err` only when the key material itself is unusable.
    pub fn verify_access_token(
        &self,
        token: &str,
        service: &str,
    ) -> Result<Option<VerifiedClaims>, KeyStoreError> {
        self.verify(token, service, TokenType::Access)
    }

    /// Verify a refresh token against the service's Refresh-Public key.
    pub fn verify_refresh_token(
        &self,
        token: &str,
        service: &str,
    ) -> Result<Option<VerifiedClaims>, KeyStoreError> {
        self.verify(token, service, TokenType::Refresh)
    }

    /// Parse claims without checking the signature or expiry.
    pub fn decode_token(token: &str) -> Option<UnverifiedClaims> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        match decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
            Ok(data) => Some(UnverifiedClaims(data.claims)),
            Err(e) => {
                debug!("failed to decode token: {e}");
                None
            }
        }
    }

    fn sign(
        &self,
        principal: &Principal,
        service: &str,
        token_type: TokenType,
        lifetime: Duration,
    ) -> Result<String, TokenError> {
        let pem = self.keys.read_key(service, token_type, KeyType::Private)?;
        let key = EncodingKey::from_rsa_pem(&pem)
            .map_err(|e| self.keys.malformed(service, token_type, KeyType::Private, e))?;
        let now = Utc::now();
        let claims = TokenClaims {
            sub: principal.id.clone(),
            name: Some(principal.username.clone()),
            iss: Some(self.issuer.clone()),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            service: Some(ServiceClaim::One(service.to_string())),
        };
        encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(TokenError::Encode)
    }

    fn verify(
        &self,
        token: &str,
        service: &str,
        token_type: TokenType,
    ) -> Result<Option<VerifiedClaims>, KeyStoreError> {
        let pem = self.keys.read_key(service, token_type, KeyType::Public)?;
        let key = DecodingKey::from_rsa_pem(&pem)
            .map_err(|e| self.keys.malformed(service, token_type, KeyType::Public, e))?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        match decode::<TokenClaims>(token, &key, &validation) {
            Ok(data) => Ok(Some(VerifiedClaims(data.claims))),
            Err(e) => {
                warn!(service, %token_type, "failed to verify token: {e}");
                Ok(None)
            }
        }
    }

    #[cfg(test)]
    fn sign_with_lifetime(
        &self,
        principal: &Principal,
        service: &str,
        token_type: TokenType,
        lifetime: Duration,
    ) -> Result<String, TokenError> {
        self.sign(principal, service, token_type, lifetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_keys_dir, principal};

    fn service() -> TokenService {
        TokenService::new(KeyStore::new(fixture_keys_dir()), "http://localhost:3100")
    }

    #[test]
    fn access_token_round_trip_carries_subject_and_service() {
        let tokens = service();
        let p = principal("user-1");
        let token = tokens.generate_access_token(&p, "attendify").unwrap();
        let claims = tokens
            .verify_access_token(&token, "attendify")
            .unwrap()
            .expect("valid token");
        assert_eq!(claims.subject(), "user-1");
        assert_eq!(
            claims.service(),
            Some(&ServiceClaim::One("attendify".into()))
        );
        assert_eq!(claims.name(), Some("user-1-name"));
        assert_eq!(claims.issuer(), Some("http://localhost:3100"));
        assert_eq!(
            claims.expires_at() - claims.issued_at(),
            ACCESS_TOKEN_EXPIRY_SECS
        );
    }

    #[test]
    fn refresh_token_has_fifteen_day_window() {
        let tokens = service();
        let token = tokens
            .generate_refresh_token(&principal("user-1"), "attendify")
            .unwrap();
        let claims = tokens
            .verify_refresh_token(&token, "attendify")
            .unwrap()
            .expect("valid token");
        assert_eq!(
            claims.expires_at() - claims.issued_at(),
            REFRESH_TOKEN_EXPIRY_SECS
        );
    }

    #[test]
    fn token_for_one_service_does_not_verify_for_another() {
        let tokens = service();
        let token = tokens
            .generate_access_token(&principal("user-1"), "ledger")
            .unwrap();
        assert!(tokens.verify_access_token(&token, "attendify").unwrap().is_none());
        assert!(tokens.verify_access_token(&token, "ledger").unwrap().is_some());
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let tokens = service();
        let token = tokens
            .generate_refresh_token(&principal("user-1"), "attendify")
            .unwrap();
        assert!(tokens.verify_access_token(&token, "attendify").unwrap().is_none());
    }

    #[test]
    fn expired_token_verifies_to_none() {
        let tokens = service();
        let token = tokens
            .sign_with_lifetime(
                &principal("user-1"),
                "attendify",
                TokenType::Access,
                Duration::days(-2),
            )
            .unwrap();
        assert!(tokens.verify_access_token(&token, "attendify").unwrap().is_none());
        // Still decodable for routing purposes.
        assert!(TokenService::decode_token(&token).is_some());
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let tokens = service();
        let token = tokens
            .generate_access_token(&principal("user-1"), "attendify")
            .unwrap();
        let other = tokens
            .generate_access_token(&principal("user-2"), "attendify")
            .unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);
        assert!(tokens.verify_access_token(&forged, "attendify").unwrap().is_none());
    }

    #[test]
    fn decode_reads_service_without_keys() {
        let token = service()
            .generate_access_token(&principal("user-1"), "attendify")
            .unwrap();
        let claims = TokenService::decode_token(&token).expect("decodable");
        assert_eq!(claims.subject(), "user-1");
        assert!(claims.is_for_service("attendify"));
        assert!(!claims.is_for_service("ledger"));
    }

    #[test]
    fn garbage_decodes_to_none() {
        assert!(TokenService::decode_token("not-a-jwt").is_none());
        assert!(TokenService::decode_token("").is_none());
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let tokens = TokenService::new(KeyStore::new(dir.path()), "issuer");
        let err = tokens
            .generate_access_token(&principal("user-1"), "attendify")
            .unwrap_err();
        assert!(matches!(err, TokenError::Key(KeyStoreError::Unreadable { .. })));
        let err = tokens.verify_access_token("a.b.c", "attendify").unwrap_err();
        assert!(matches!(err, KeyStoreError::Unreadable { .. }));
    }
}

//! Session flows behind the auth handlers: login through the identity
//! provider, and token refresh with locally signed tokens.

use attendify_core::auth::AuthError;
use attendify_core::auth::jwt::TokenService;
use attendify_core::auth::resolver::IdentityResolver;
use attendify_core::models::auth::{NewUser, Principal, ProviderProfile};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// A principal together with the token pair handed to the client.
#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Principal,
    pub access_token: String,
    pub refresh_token: String,
}

/// Log in through the identity provider for this service.
///
/// The provider's tokens are returned as-is. The local user is looked up by
/// email and created from the provider profile if missing, keyed by the
/// provider token's subject.
pub async fn login(resolver: &IdentityResolver, email: &str, password: &str) -> AppResult<Session> {
    let credentials = resolver
        .provider()
        .login(email, password, resolver.service())
        .await
        .map_err(|e| {
            debug!(email, "provider login rejected: {e}");
            AppError::Validation(e.to_string())
        })?;

    let principal = match resolver.store().find_by_email(email).await? {
        Some(principal) if principal.is_deleted() => {
            return Err(AuthError::UserNotFound.into());
        }
        Some(principal) => principal,
        None => {
            let profile = match resolver.provider().profile(&credentials.access_token).await {
                Ok(profile) => profile,
                Err(e) => {
                    warn!(email, "profile fetch after login failed: {e}");
                    ProviderProfile {
                        id: None,
                        email: email.to_string(),
                        username: None,
                        first_name: None,
                        last_name: None,
                    }
                }
            };
            // Later requests resolve the provider token's `sub`, so the row
            // must carry that id whenever the token has one.
            let id = TokenService::decode_token(&credentials.access_token)
                .map(|claims| claims.subject().to_string())
                .filter(|sub| !sub.is_empty())
                .or_else(|| profile.id.clone())
                .unwrap_or_else(|| Uuid::now_v7().to_string());
            let profile = ProviderProfile {
                email: email.to_string(),
                ..profile
            };
            let principal = resolver
                .store()
                .create(NewUser::from_profile(&id, &profile, "login"))
                .await?;
            info!(user_id = %principal.id, email, "created user on first login");
            principal
        }
    };

    Ok(Session {
        principal,
        access_token: credentials.access_token,
        refresh_token: credentials.refresh_token,
    })
}

/// Exchange a refresh token for a new pair signed by this service.
pub async fn refresh(resolver: &IdentityResolver, refresh_token: &str) -> AppResult<Session> {
    let claims = resolver.verify_refresh(refresh_token)?;
    let user_id = claims.subject();

    let principal = resolver
        .store()
        .find_by_id(user_id)
        .await?
        .filter(|p| !p.is_deleted())
        .ok_or(AuthError::UserNotFound)?;

    let (access_token, refresh_token) = issue_tokens(resolver, &principal)?;
    info!(user_id, "refreshed session");
    Ok(Session {
        principal,
        access_token,
        refresh_token,
    })
}

/// Sign an access/refresh pair for `principal` with this service's keys.
pub fn issue_tokens(resolver: &IdentityResolver, principal: &Principal) -> AppResult<(String, String)> {
    let tokens = resolver.tokens();
    let service = resolver.service();
    let access = tokens
        .generate_access_token(principal, service)
        .map_err(AuthError::from)?;
    let refresh = tokens
        .generate_refresh_token(principal, service)
        .map_err(AuthError::from)?;
    Ok((access, refresh))
}

//! External identity provider (OpenID API) client.
//!
//! Single attempt per call: provider outages surface immediately as
//! authentication failures with the provider's message.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::models::auth::{ProviderCredentials, ProviderProfile};

/// Provider call failures. `Display` is the message shown to the client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with an error.
    #[error("{0}")]
    Rejected(String),

    /// The provider could not be reached or answered garbage.
    #[error("{0}")]
    Unavailable(String),
}

/// Profile and login operations of the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `GET /auth/profile` with the bearer token.
    async fn profile(&self, token: &str) -> Result<ProviderProfile, ProviderError>;

    /// `POST /auth/login?service=<service>` with email and password.
    async fn login(
        &self,
        email: &str,
        password: &str,
        service: &str,
    ) -> Result<ProviderCredentials, ProviderError>;
}

/// Response envelope used by every provider endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// reqwest-backed [`IdentityProvider`].
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpIdentityProvider {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::Unavailable(format!("invalid provider URL: {e}")))
    }

    async fn read<T: DeserializeOwned>(
        response: reqwest::Response,
        action: &str,
        extract: impl FnOnce(serde_json::Value) -> serde_json::Value,
    ) -> Result<T, ProviderError> {
        let status = response.status();
        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("Failed to {action}: {e}")))?;

        if !status.is_success() {
            let message = envelope
                .message
                .or(envelope.error)
                .unwrap_or_else(|| format!("Failed to {action}"));
            debug!(%status, "identity provider rejected request: {message}");
            return Err(ProviderError::Rejected(message));
        }

        let data = envelope
            .data
            .ok_or_else(|| ProviderError::Rejected(format!("Failed to {action}")))?;
        serde_json::from_value(extract(data))
            .map_err(|e| ProviderError::Unavailable(format!("Failed to {action}: {e}")))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn profile(&self, token: &str) -> Result<ProviderProfile, ProviderError> {
        let url = self.endpoint("auth/profile")?;
        info!("fetching user profile from identity provider");
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("Failed to fetch profile: {e}")))?;
        Self::read(response, "fetch profile", |data| data).await
    }

    async fn login(
        &self,
        email: &str,
        password: &str,
        service: &str,
    ) -> Result<ProviderCredentials, ProviderError> {
        let mut url = self.endpoint("auth/login")?;
        url.query_pairs_mut().append_pair("service", service);
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("Failed to log in: {e}")))?;
        // Credentials are nested under `credentials` in current provider
        // versions and flat in older ones.
        Self::read(response, "log in", |mut data| {
            if data.get("credentials").is_some() {
                data["credentials"].take()
            } else {
                data
            }
        })
        .await
    }
}

//! API server configuration.

use std::path::PathBuf;

use crate::services::cookies::CookieSettings;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Redis connection URL for the principal cache.
    pub redis_url: String,
    /// Name of this deployment; tokens must carry it in their `service` claim.
    pub service_name: String,
    /// Directory holding `<service><KeyType><TokenType>.pem` files.
    pub keys_dir: PathBuf,
    /// Base URL of the identity provider.
    pub openid_api: String,
    /// Issuer stamped into tokens this service signs.
    pub backend_url: String,
    /// Domain attribute for auth cookies.
    pub cookie_domain: String,
    /// Production mode marks cookies `Secure`.
    pub production: bool,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable            | Default                                |
    /// |---------------------|----------------------------------------|
    /// | `BIND_ADDR`         | `127.0.0.1:3100`                       |
    /// | `DATABASE_URL`      | `postgres://localhost:5432/attendify`  |
    /// | `REDIS_URL`         | `redis://127.0.0.1:6379`               |
    /// | `SERVICE_NAME`      | `attendify`                            |
    /// | `KEYS_DIR`          | `./keys`                               |
    /// | `OPENID_API`        | `http://localhost:4000`                |
    /// | `BACKEND_URL`       | `http://localhost:3100`                |
    /// | `COOKIE_DOMAIN`     | `localhost`                            |
    /// | `NODE_ENV`/`APP_ENV`| `development`                          |
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.into());
        let env = lookup("NODE_ENV")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".into());
        Self {
            bind_addr: var_or("BIND_ADDR", "127.0.0.1:3100"),
            pg_connection_url: var_or("DATABASE_URL", "postgres://localhost:5432/attendify"),
            redis_url: var_or("REDIS_URL", "redis://127.0.0.1:6379"),
            service_name: var_or("SERVICE_NAME", "attendify"),
            keys_dir: PathBuf::from(var_or("KEYS_DIR", "./keys")),
            openid_api: var_or("OPENID_API", "http://localhost:4000"),
            backend_url: var_or("BACKEND_URL", "http://localhost:3100"),
            cookie_domain: var_or("COOKIE_DOMAIN", "localhost"),
            production: is_production(&env),
        }
    }

    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            domain: self.cookie_domain.clone(),
            secure: self.production,
        }
    }
}

/// `production` (any case) enables production behaviour.
pub fn is_production(env: &str) -> bool {
    env.eq_ignore_ascii_case("production")
}

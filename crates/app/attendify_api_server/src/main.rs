//! Attendify auth gateway server binary.

use std::path::PathBuf;
use std::sync::Arc;

use attendify_api::config::ApiConfig;
use attendify_core::auth::jwt::TokenService;
use attendify_core::auth::keys::KeyStore;
use attendify_core::auth::provider::HttpIdentityProvider;
use attendify_core::auth::resolver::IdentityResolver;
use attendify_core::auth::store::PgUserStore;
use attendify_core::cache::Cache;
use attendify_core::cache::redis::RedisCache;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments. Each flag falls back to its environment variable, then to
/// the [`ApiConfig::from_env`] default.
#[derive(Parser, Debug)]
#[command(name = "attendify_api_server", about = "Attendify auth gateway")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR")]
    bind_addr: Option<String>,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Redis connection URL for the principal cache.
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Service name tokens must be issued for.
    #[arg(long, env = "SERVICE_NAME")]
    service_name: Option<String>,

    /// Directory holding the service's PEM key files.
    #[arg(long, env = "KEYS_DIR")]
    keys_dir: Option<PathBuf>,

    /// Identity provider base URL.
    #[arg(long, env = "OPENID_API")]
    openid_api: Option<String>,

    /// Issuer for tokens signed by this service.
    #[arg(long, env = "BACKEND_URL")]
    backend_url: Option<String>,

    /// Domain attribute for auth cookies.
    #[arg(long, env = "COOKIE_DOMAIN")]
    cookie_domain: Option<String>,

    /// Runtime environment; `production` enables secure cookies. Without
    /// `NODE_ENV`, `APP_ENV` is consulted.
    #[arg(long, env = "NODE_ENV")]
    env: Option<String>,

    /// Skip running database migrations on startup.
    #[arg(long, default_value_t = false)]
    skip_migrations: bool,
}

impl Args {
    /// Flags layered over `base`.
    fn into_config(self, base: ApiConfig) -> ApiConfig {
        ApiConfig {
            bind_addr: self.bind_addr.unwrap_or(base.bind_addr),
            pg_connection_url: self.database_url.unwrap_or(base.pg_connection_url),
            redis_url: self.redis_url.unwrap_or(base.redis_url),
            service_name: self.service_name.unwrap_or(base.service_name),
            keys_dir: self.keys_dir.unwrap_or(base.keys_dir),
            openid_api: self.openid_api.unwrap_or(base.openid_api),
            backend_url: self.backend_url.unwrap_or(base.backend_url),
            cookie_domain: self.cookie_domain.unwrap_or(base.cookie_domain),
            production: self
                .env
                .as_deref()
                .map_or(base.production, attendify_api::config::is_production),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,attendify_api=debug,attendify_core=debug".into()),
        )
        .init();

    let args = Args::parse();
    let max_connections = args.max_connections;
    let skip_migrations = args.skip_migrations;
    let config = args.into_config(ApiConfig::from_env());

    info!(
        service = %config.service_name,
        bind_addr = %config.bind_addr,
        keys_dir = %config.keys_dir.display(),
        production = config.production,
        "starting attendify_api_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    if skip_migrations {
        info!("skipping database migrations");
    } else {
        info!("running database migrations");
        attendify_api::migrate(&pool).await?;
    }

    // Connects lazily on first use.
    let cache = Cache::new(RedisCache::open(&config.redis_url)?);
    let store = Arc::new(PgUserStore::new(pool, config.service_name.clone()));
    let provider = Arc::new(HttpIdentityProvider::new(&config.openid_api)?);
    let tokens = TokenService::new(
        KeyStore::new(config.keys_dir.clone()),
        config.backend_url.clone(),
    );
    let resolver = IdentityResolver::new(
        config.service_name.clone(),
        tokens,
        store,
        cache.clone(),
        provider,
    );

    let state = attendify_api::AppState {
        config: config.clone(),
        resolver,
    };
    let app = attendify_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down, disconnecting cache");
    if let Err(e) = cache.disconnect().await {
        warn!("cache disconnect failed: {e}");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}

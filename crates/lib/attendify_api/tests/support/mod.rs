//! Shared harness: a router over in-memory doubles and RSA fixture keys.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use attendify_api::AppState;
use attendify_api::config::ApiConfig;
use attendify_core::auth::jwt::TokenService;
use attendify_core::auth::keys::KeyStore;
use attendify_core::auth::principal::{PrincipalRows, RoleGrant, project_principal};
use attendify_core::auth::resolver::IdentityResolver;
use attendify_core::cache::{Cache, CacheStore};
use attendify_core::models::auth::Principal;
use attendify_core::testing::{
    MemoryUserStore, RecordingCache, StubIdentityProvider, fixture_keys_dir, user_record,
};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use tower::ServiceExt;

pub const SERVICE: &str = "attendify";
pub const ISSUER: &str = "http://localhost:3100";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryUserStore>,
    pub cache: Arc<RecordingCache>,
    pub provider: Arc<StubIdentityProvider>,
    pub tokens: TokenService,
}

impl TestApp {
    pub fn new() -> Self {
        let cache = Arc::new(RecordingCache::new());
        Self::assemble(cache.clone(), cache, fixture_keys_dir())
    }

    /// App over an arbitrary cache backend; `self.cache` is then unused.
    pub fn with_cache(cache: Arc<dyn CacheStore>) -> Self {
        Self::assemble(cache, Arc::new(RecordingCache::new()), fixture_keys_dir())
    }

    /// App whose key directory has no key files.
    pub fn with_keys_dir(dir: PathBuf) -> Self {
        let cache = Arc::new(RecordingCache::new());
        Self::assemble(cache.clone(), cache, dir)
    }

    fn assemble(
        backend: Arc<dyn CacheStore>,
        recording: Arc<RecordingCache>,
        keys_dir: PathBuf,
    ) -> Self {
        let store = Arc::new(MemoryUserStore::new(SERVICE));
        let provider = Arc::new(StubIdentityProvider::new());
        let tokens = TokenService::new(KeyStore::new(keys_dir.clone()), ISSUER);
        let resolver = IdentityResolver::new(
            SERVICE,
            tokens.clone(),
            store.clone(),
            Cache::from_arc(backend),
            provider.clone(),
        );
        let state = AppState {
            config: config(keys_dir),
            resolver,
        };
        Self {
            router: attendify_api::router(state.clone()),
            state,
            store,
            cache: recording,
            provider,
            tokens: TokenService::new(KeyStore::new(fixture_keys_dir()), ISSUER),
        }
    }

    pub fn access_token(&self, principal: &Principal) -> String {
        self.tokens
            .generate_access_token(principal, SERVICE)
            .unwrap()
    }

    pub fn refresh_token(&self, principal: &Principal) -> String {
        self.tokens
            .generate_refresh_token(principal, SERVICE)
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn config(keys_dir: PathBuf) -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        pg_connection_url: "postgres://localhost:5432/attendify".into(),
        redis_url: "redis://127.0.0.1:6379".into(),
        service_name: SERVICE.into(),
        keys_dir,
        openid_api: "http://localhost:4000".into(),
        backend_url: ISSUER.into(),
        cookie_domain: "attendify.test".into(),
        production: false,
    }
}

/// Active principal holding `roles` (each with its permission list) and
/// `direct` permissions.
pub fn principal_with(id: &str, roles: &[(&str, &[&str])], direct: &[&str]) -> Principal {
    let rows = PrincipalRows {
        user: user_record(id),
        roles: roles
            .iter()
            .map(|(role, perms)| RoleGrant {
                role: role.to_string(),
                permissions: perms.iter().map(|p| p.to_string()).collect(),
            })
            .collect(),
        direct_permissions: direct.iter().map(|p| p.to_string()).collect(),
        groups: vec![],
    };
    project_principal(rows, SERVICE)
}

pub fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

pub fn bearer(builder: axum::http::request::Builder, token: &str) -> axum::http::request::Builder {
    builder.header(header::AUTHORIZATION, format!("Bearer {token}"))
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// All `Set-Cookie` header values.
pub fn set_cookies(resp: &Response<Body>) -> Vec<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

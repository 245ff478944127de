//! Login, refresh and logout flows.

mod support;

use attendify_core::models::auth::{ProviderCredentials, ProviderProfile};
use attendify_core::testing::principal;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use serde_json::json;

use support::{SERVICE, TestApp, bearer, body_json, json_request, set_cookies};

fn provider_credentials() -> ProviderCredentials {
    ProviderCredentials {
        access_token: "provider-access".into(),
        refresh_token: "provider-refresh".into(),
    }
}

#[tokio::test]
async fn login_requires_email_and_password() {
    let app = TestApp::new();
    let resp = app
        .send(json_request("POST", "/auth/login", json!({ "email": "a@b.c" })))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["message"],
        "Email and password are required"
    );
    assert_eq!(app.provider.login_calls(), 0);
}

#[tokio::test]
async fn login_without_body_is_a_shaped_400() {
    let app = TestApp::new();
    let resp = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Email and password are required");
    assert_eq!(app.provider.login_calls(), 0);
}

#[tokio::test]
async fn login_with_malformed_body_is_a_shaped_400() {
    let app = TestApp::new();
    let resp = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("email=a@b.c"))
                .unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["message"],
        "Email and password are required"
    );
}

#[tokio::test]
async fn login_surfaces_provider_rejection() {
    let app = TestApp::new();
    let resp = app
        .send(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "a@b.c", "password": "nope" }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["message"], "Invalid credentials");
    assert!(app.store.created().is_empty());
}

#[tokio::test]
async fn first_login_creates_user_and_sets_cookies() {
    let app = TestApp::new();
    app.provider.set_login(provider_credentials());
    app.provider.set_profile(ProviderProfile {
        id: Some("op-42".into()),
        email: "ada@example.com".into(),
        username: Some("ada".into()),
        first_name: Some("Ada".into()),
        last_name: Some("Lovelace".into()),
    });

    let resp = app
        .send(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "ada@example.com", "password": "secret" }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let cookies = set_cookies(&resp);
    assert!(
        cookies
            .iter()
            .any(|c| c.starts_with("accessToken=provider-access") && c.contains("HttpOnly"))
    );
    assert!(
        cookies
            .iter()
            .any(|c| c.starts_with("refreshToken=provider-refresh")
                && c.contains("SameSite=Strict")
                && c.contains("Domain=attendify.test"))
    );

    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Login successful");
    assert_eq!(json["data"]["accessToken"], "provider-access");
    assert_eq!(json["data"]["refreshToken"], "provider-refresh");
    assert_eq!(json["data"]["user"]["id"], "op-42");
    assert_eq!(json["data"]["user"]["firstName"], "Ada");
    assert_eq!(app.store.created(), vec!["op-42".to_string()]);
}

#[tokio::test]
async fn login_reuses_existing_user() {
    let app = TestApp::new();
    app.provider.set_login(provider_credentials());
    app.store.insert(principal("u-1"));

    let resp = app
        .send(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "u-1@example.com", "password": "secret" }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["user"]["id"], "u-1");
    assert!(app.store.created().is_empty());
    assert_eq!(app.provider.profile_calls(), 0);
}

#[tokio::test]
async fn login_tolerates_profile_failure() {
    let app = TestApp::new();
    app.provider.set_login(provider_credentials());
    app.provider.fail_profile("profile service down");

    let resp = app
        .send(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "new@example.com", "password": "secret" }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["user"]["email"], "new@example.com");
    assert_eq!(app.store.created().len(), 1);
}

#[tokio::test]
async fn user_created_without_profile_is_found_by_token_subject() {
    let app = TestApp::new();
    let provider_access = app.access_token(&principal("op-sub"));
    app.provider.set_login(ProviderCredentials {
        access_token: provider_access.clone(),
        refresh_token: "provider-refresh".into(),
    });
    app.provider.fail_profile("profile service down");

    let resp = app
        .send(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "new@example.com", "password": "secret" }),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(app.store.created(), vec!["op-sub".to_string()]);

    let resp = app
        .send(
            bearer(support::get("/auth/me"), &provider_access)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["id"], "op-sub");
    assert_eq!(json["data"]["email"], "new@example.com");
    assert_eq!(app.store.created().len(), 1);
}

#[tokio::test]
async fn refresh_from_body_issues_verifiable_pair() {
    let app = TestApp::new();
    let user = principal("u-1");
    app.store.insert(user.clone());

    let resp = app
        .send(json_request(
            "POST",
            "/auth/refresh",
            json!({ "refreshToken": app.refresh_token(&user) }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(set_cookies(&resp).len(), 2);
    let json = body_json(resp).await;
    let access = json["data"]["accessToken"].as_str().unwrap();
    let refresh = json["data"]["refreshToken"].as_str().unwrap();

    let claims = app
        .tokens
        .verify_access_token(access, SERVICE)
        .unwrap()
        .expect("new access token verifies");
    assert_eq!(claims.subject(), "u-1");
    assert!(
        app.tokens
            .verify_refresh_token(refresh, SERVICE)
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn refresh_reads_cookie_when_body_is_empty() {
    let app = TestApp::new();
    let user = principal("u-1");
    app.store.insert(user.clone());

    let resp = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .header(
                    header::COOKIE,
                    format!("refreshToken={}", app.refresh_token(&user)),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["user"]["id"], "u-1");
}

#[tokio::test]
async fn access_token_cannot_refresh() {
    let app = TestApp::new();
    let user = principal("u-1");
    app.store.insert(user.clone());

    let resp = app
        .send(json_request(
            "POST",
            "/auth/refresh",
            json!({ "refreshToken": app.access_token(&user) }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "Invalid token");
}

#[tokio::test]
async fn refresh_for_deleted_user_is_rejected() {
    let app = TestApp::new();
    let mut user = principal("u-1");
    user.deleted_at = Some(Utc::now());
    app.store.insert(user.clone());

    let resp = app
        .send(json_request(
            "POST",
            "/auth/refresh",
            json!({ "refreshToken": app.refresh_token(&user) }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "User not found");
}

#[tokio::test]
async fn refresh_without_token_is_rejected() {
    let app = TestApp::new();
    let resp = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "No token provided");
}

#[tokio::test]
async fn logout_evicts_cache_and_clears_cookies() {
    let app = TestApp::new();
    let user = principal("u-1");
    app.store.insert(user.clone());
    app.cache.prime("users:u-1", &user).await;

    let resp = app
        .send(
            bearer(
                Request::builder().method("POST").uri("/auth/logout"),
                &app.access_token(&user),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let cookies = set_cookies(&resp);
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=;")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=;")));
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));

    let cached = attendify_core::cache::CacheStore::get_raw(app.cache.as_ref(), "users:u-1")
        .await
        .unwrap();
    assert!(cached.is_none());
}

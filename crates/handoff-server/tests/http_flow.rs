//! End-to-end tests for the HTTP endpoints.
//!
//! Run with: cargo test -p handoff-server --test http_flow

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use handoff_core::HandoffConfig;
use handoff_server::{AppState, router};
use handoff_session::{
    Identity, IdentityProfile, IdentityStore, MemoryStore, SessionRecord, SessionStore,
    StoreError, Stores,
};
use handoff_token::{IdentityAssertion, SharedSecret, TokenCodec};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

struct UnreachableSessions;

#[async_trait]
impl SessionStore for UnreachableSessions {
    async fn insert(&self, _record: SessionRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn find_active(
        &self,
        _token: &str,
        _now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        Err(StoreError::Unavailable("timed out".to_string()))
    }

    async fn delete(&self, _token: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("timed out".to_string()))
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("timed out".to_string()))
    }
}

struct UnreachableIdentities;

#[async_trait]
impl IdentityStore for UnreachableIdentities {
    async fn upsert(&self, _profile: &IdentityProfile) -> Result<Identity, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<Identity>, StoreError> {
        Err(StoreError::Unavailable("timed out".to_string()))
    }
}

fn secret() -> SharedSecret {
    SharedSecret::new(SECRET).unwrap()
}

fn app_with(config: HandoffConfig, stores: Stores) -> Router {
    router(Arc::new(AppState::new(config, &secret(), stores)))
}

fn app() -> Router {
    app_with(HandoffConfig::default(), Stores::memory())
}

fn handoff_token(created_at: DateTime<Utc>) -> String {
    let assertion = IdentityAssertion::new("ada@example.com", created_at)
        .with_first_name("Ada")
        .with_customer_id("7001");
    TokenCodec::new(&secret()).encode(&assertion).unwrap()
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// `name=value` from the response's Set-Cookie header.
fn session_cookie(response: &Response) -> String {
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn login(app: &Router) -> String {
    let uri = format!("/auth/sso/callback?token={}", handoff_token(Utc::now()));
    let response = get(app, &uri, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie(&response)
}

#[tokio::test]
async fn test_health() {
    let response = get(&app(), "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_callback_without_token() {
    let app = app();
    for uri in ["/auth/sso/callback", "/auth/sso/callback?token="] {
        let response = get(&app, uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login?error=missing_token");
    }
}

#[tokio::test]
async fn test_callback_rejects_bad_tokens_uniformly() {
    let app = app();
    let stale = handoff_token(Utc::now() - Duration::minutes(20));
    let foreign = TokenCodec::new(&SharedSecret::new("other-secret").unwrap())
        .encode(&IdentityAssertion::new("ada@example.com", Utc::now()))
        .unwrap();

    for token in [stale.as_str(), foreign.as_str(), "not-a-token"] {
        let response = get(&app, &format!("/auth/sso/callback?token={token}"), None).await;
        assert_eq!(location(&response), "/login?error=invalid_token");
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}

#[tokio::test]
async fn test_callback_starts_session() {
    let app = app();
    let uri = format!(
        "/auth/sso/callback?token={}&return_to=%2Forders",
        handoff_token(Utc::now())
    );
    let response = get(&app, &uri, None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/orders");

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("handoff_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=604800"));

    let cookie = session_cookie(&response);
    let response = get(&app, "/api/me", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let me = json_body(response).await;
    assert_eq!(me["email"], "ada@example.com");
    assert_eq!(me["first_name"], "Ada");
    assert_eq!(me["customer_id"], "7001");
}

#[tokio::test]
async fn test_callback_ignores_offsite_return_to() {
    let app = app();
    let uri = format!(
        "/auth/sso/callback?token={}&return_to=https%3A%2F%2Fevil.example",
        handoff_token(Utc::now())
    );
    let response = get(&app, &uri, None).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_repeat_login_reuses_identity() {
    let app = app();
    let first = login(&app).await;
    let second = login(&app).await;
    assert_ne!(first, second);

    let a = json_body(get(&app, "/api/me", Some(&first)).await).await;
    let b = json_body(get(&app, "/api/me", Some(&second)).await).await;
    assert_eq!(a["id"], b["id"]);
}

#[tokio::test]
async fn test_me_distinguishes_missing_and_invalid() {
    let app = app();

    let response = get(&app, "/api/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    assert_eq!(json_body(response).await["error"], "not_authenticated");

    let response = get(&app, "/api/me", Some("handoff_session=forged")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "invalid_or_expired_session");
}

#[tokio::test]
async fn test_bearer_handle_accepted() {
    let app = app();
    let cookie = login(&app).await;
    let handle = cookie.trim_start_matches("handoff_session=");

    let request = Request::builder()
        .uri("/api/me")
        .header(header::AUTHORIZATION, format!("Bearer {handle}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_once() {
    let app = app();
    let cookie = login(&app).await;

    let response = post(&app, "/auth/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(json_body(response).await["revoked"], true);

    let response = post(&app, "/auth/logout", Some(&cookie)).await;
    assert_eq!(json_body(response).await["revoked"], false);

    let response = get(&app, "/api/me", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post(&app, "/auth/logout", None).await;
    assert_eq!(json_body(response).await["revoked"], false);
}

#[tokio::test]
async fn test_store_outage_is_503_not_401() {
    let stores = Stores {
        sessions: Arc::new(UnreachableSessions),
        identities: Arc::new(MemoryStore::new()),
    };
    let app = app_with(HandoffConfig::default(), stores);

    let response = get(&app, "/api/me", Some("handoff_session=anything")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"], "session_store_unavailable");

    let uri = format!("/auth/sso/callback?token={}", handoff_token(Utc::now()));
    let response = get(&app, &uri, None).await;
    assert_eq!(location(&response), "/login?error=authentication_failed");
}

#[tokio::test]
async fn test_identity_outage_during_callback() {
    let stores = Stores {
        sessions: Arc::new(MemoryStore::new()),
        identities: Arc::new(UnreachableIdentities),
    };
    let app = app_with(HandoffConfig::default(), stores);

    let uri = format!("/auth/sso/callback?token={}", handoff_token(Utc::now()));
    let response = get(&app, &uri, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?error=user_creation_failed");
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_outbound_token() {
    let mut config = HandoffConfig::default();
    config.server.outbound_redirect = Some("https://shop.example/sso?token={token}".to_string());
    let app = app_with(config, Stores::memory());
    let cookie = login(&app).await;

    let response = post(&app, "/api/auth/outbound-token", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    let token = body["token"].as_str().unwrap();
    let assertion = TokenCodec::new(&secret()).decode(token).unwrap();
    assert_eq!(assertion.email, "ada@example.com");
    assert_eq!(assertion.customer_id.as_deref(), Some("7001"));
    assert_eq!(
        body["redirect_url"],
        format!("https://shop.example/sso?token={token}")
    );

    let response = post(&app, "/api/auth/outbound-token", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_outbound_token_without_template() {
    let app = app();
    let cookie = login(&app).await;
    let body = json_body(post(&app, "/api/auth/outbound-token", Some(&cookie)).await).await;
    assert!(body["token"].is_string());
    assert!(body.get("redirect_url").is_none());
}

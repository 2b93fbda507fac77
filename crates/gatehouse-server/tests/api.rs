//! End-to-end tests driving the router in-process.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use gatehouse_crypto::{current_timestamp, hash_password};
use gatehouse_identity::ProviderProfile;
use gatehouse_methods::{oauth::OAuthFlowState, AuthMethodsError, Provider, ProviderRegistry};
use gatehouse_server::{create_router, AppState, Config};
use gatehouse_storage::{RocksDbStorage, Storage, CF_OAUTH_STATES};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use url::Url;

const SECRET: &str = "integration-test-signing-secret-0123456789";
const FRONTEND_URL: &str = "http://localhost:3000/auth/done";
const GOOD_CODE: &str = "good-code";

struct StubProvider;

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        "github"
    }

    fn redirect_uri(&self) -> &str {
        "http://localhost:8008/callback/github"
    }

    fn authorization_url(&self, state: &str) -> gatehouse_methods::Result<String> {
        Ok(format!("https://github.example/authorize?state={}", state))
    }

    async fn exchange_code(&self, code: &str) -> gatehouse_methods::Result<String> {
        if code == GOOD_CODE {
            Ok("provider-token".to_string())
        } else {
            Err(AuthMethodsError::ProviderExchangeFailed("bad_verification_code".to_string()))
        }
    }

    async fn fetch_identity(&self, _access_token: &str) -> gatehouse_methods::Result<ProviderProfile> {
        Ok(ProviderProfile {
            provider: "github".to_string(),
            external_id: "1001".to_string(),
            email: Some("octo@example.com".to_string()),
            username: "octocat".to_string(),
            display_name: Some("Octo Cat".to_string()),
            avatar_url: None,
        })
    }
}

fn test_app(backup_users: Option<String>) -> Router {
    let mut vars: HashMap<&str, String> = HashMap::new();
    vars.insert("JWT_SECRET_KEY", SECRET.to_string());
    vars.insert("FRONTEND_URL", FRONTEND_URL.to_string());
    if let Some(json) = backup_users {
        vars.insert("BACKUP_USERS", json);
    }
    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

    let storage = Arc::new(RocksDbStorage::open_test().unwrap());
    let mut providers = ProviderRegistry::new();
    providers.register(Arc::new(StubProvider));

    let state = AppState::with_storage(config, storage, providers).unwrap();
    create_router(Arc::new(state))
}

fn backup_config() -> String {
    let hash = hash_password(b"admin123").unwrap();
    json!({
        "admin": {
            "password_hash": hash,
            "is_admin": true,
            "permissions": {"*": ["*"]}
        }
    })
    .to_string()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    request
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> Url {
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    Url::parse(location).unwrap()
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

async fn start_login(app: &Router) -> String {
    let response = send(app, get("/login/github")).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["state"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Full OAuth round trip; returns (access_token, refresh_token)
async fn oauth_login(app: &Router) -> (String, String) {
    let state = start_login(app).await;
    let response = send(
        app,
        get(&format!("/callback/github?code={}&state={}", GOOD_CODE, state)),
    )
    .await;
    assert!(response.status().is_redirection());

    let target = location(&response);
    (
        query_param(&target, "access_token").unwrap(),
        query_param(&target, "refresh_token").unwrap(),
    )
}

async fn backup_login(app: &Router) -> Value {
    let response = send(
        app,
        post_json(
            "/backup-login",
            json!({"username": "admin", "password": "admin123"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn test_login_returns_auth_url_and_state() {
    let app = test_app(None);

    let response = send(&app, get("/login/github")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let state = body["state"].as_str().unwrap();
    let auth_url = body["auth_url"].as_str().unwrap();
    assert!(auth_url.ends_with(state));
}

#[tokio::test]
async fn test_login_redirect_mode() {
    let app = test_app(None);

    let response = send(&app, get("/login/github?redirect=true")).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response).host_str(), Some("github.example"));
}

#[tokio::test]
async fn test_login_unknown_provider() {
    let app = test_app(None);

    let response = send(&app, get("/login/myspace")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_PROVIDER");
}

#[tokio::test]
async fn test_login_rejects_foreign_redirect() {
    let app = test_app(None);

    let response = send(
        &app,
        get("/login/github?client_redirect_uri=https%3A%2F%2Fevil.example%2Fsteal"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"]["code"],
        "REDIRECT_NOT_ALLOWED"
    );
}

#[tokio::test]
async fn test_callback_appends_credentials() {
    let app = test_app(None);
    let state = start_login(&app).await;

    let response = send(
        &app,
        get(&format!("/callback/github?code={}&state={}", GOOD_CODE, state)),
    )
    .await;
    assert!(response.status().is_redirection());

    let target = location(&response);
    assert!(target.as_str().starts_with(FRONTEND_URL));
    assert!(query_param(&target, "access_token").is_some());
    assert!(query_param(&target, "refresh_token").is_some());
    assert_eq!(query_param(&target, "token_type").as_deref(), Some("Bearer"));
    assert!(query_param(&target, "error").is_none());
}

#[tokio::test]
async fn test_callback_replay_fails() {
    let app = test_app(None);
    let state = start_login(&app).await;
    let uri = format!("/callback/github?code={}&state={}", GOOD_CODE, state);

    let first = send(&app, get(&uri)).await;
    assert!(query_param(&location(&first), "access_token").is_some());

    let second = send(&app, get(&uri)).await;
    let target = location(&second);
    assert_eq!(query_param(&target, "error").as_deref(), Some("oauth_failed"));
    assert!(query_param(&target, "access_token").is_none());
}

#[tokio::test]
async fn test_callback_bad_code_redirects_with_error() {
    let app = test_app(None);
    let state = start_login(&app).await;

    let response = send(
        &app,
        get(&format!("/callback/github?code=wrong&state={}", state)),
    )
    .await;

    let target = location(&response);
    assert!(target.as_str().starts_with(FRONTEND_URL));
    assert_eq!(query_param(&target, "error").as_deref(), Some("oauth_failed"));
}

#[tokio::test]
async fn test_refresh_rotates_and_old_token_is_revoked() {
    let app = test_app(None);
    let (_, refresh_token) = oauth_login(&app).await;

    let response = send(
        &app,
        post_json("/refresh", json!({"refresh_token": refresh_token})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["access_token"].is_string());
    assert_ne!(body["refresh_token"].as_str().unwrap(), refresh_token);

    let replay = send(
        &app,
        post_json("/refresh", json!({"refresh_token": refresh_token})),
    )
    .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(replay).await["error"]["code"],
        "REFRESH_TOKEN_REVOKED"
    );
}

#[tokio::test]
async fn test_refresh_unknown_token() {
    let app = test_app(None);

    let response = send(
        &app,
        post_json("/refresh", json!({"refresh_token": "never-issued"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"]["code"],
        "REFRESH_TOKEN_NOT_FOUND"
    );
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let app = test_app(None);
    let (_, refresh_token) = oauth_login(&app).await;

    for _ in 0..2 {
        let response = send(
            &app,
            post_json("/logout", json!({"refresh_token": refresh_token})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let unknown = send(
        &app,
        post_json("/logout", json!({"refresh_token": "never-issued"})),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        post_json("/refresh", json!({"refresh_token": refresh_token})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_bearer_token() {
    let app = test_app(None);

    let response = send(&app, get("/me")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, with_bearer(get("/me"), "not-a-jwt")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_me_returns_profile() {
    let app = test_app(None);
    let (access_token, _) = oauth_login(&app).await;

    let response = send(&app, with_bearer(get("/me"), &access_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["provider"], "github");
    assert_eq!(body["username"], "octocat");
    assert_eq!(body["email"], "octo@example.com");
    assert_eq!(body["is_admin"], false);
}

#[tokio::test]
async fn test_revoke_all_sessions() {
    let app = test_app(None);
    let (access_token, first_refresh) = oauth_login(&app).await;
    let (_, second_refresh) = oauth_login(&app).await;

    let response = send(
        &app,
        with_bearer(post_json("/sessions/revoke-all", json!({})), &access_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["revoked"], 2);

    for refresh_token in [first_refresh, second_refresh] {
        let response = send(
            &app,
            post_json("/refresh", json!({"refresh_token": refresh_token})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_backup_login_disabled_without_config() {
    let app = test_app(None);

    let response = send(
        &app,
        post_json(
            "/backup-login",
            json!({"username": "admin", "password": "admin123"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_backup_login_failures_are_indistinguishable() {
    let app = test_app(Some(backup_config()));

    let wrong_password = send(
        &app,
        post_json(
            "/backup-login",
            json!({"username": "admin", "password": "nope"}),
        ),
    )
    .await;
    let unknown_user = send(
        &app,
        post_json(
            "/backup-login",
            json!({"username": "mallory", "password": "admin123"}),
        ),
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong_password).await, body_json(unknown_user).await);
}

#[tokio::test]
async fn test_backup_login_success() {
    let app = test_app(Some(backup_config()));

    let body = backup_login(&app).await;
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["user"]["provider"], "backup");
    assert_eq!(body["user"]["is_admin"], true);
}

#[tokio::test]
async fn test_admin_endpoints_require_admin() {
    let app = test_app(Some(backup_config()));
    let (user_token, _) = oauth_login(&app).await;

    let me = body_json(send(&app, with_bearer(get("/me"), &user_token)).await).await;
    let user_id = me["user_id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/admin/users/{}/permissions", user_id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"is_admin": false, "permissions": {"billing": ["read"]}}).to_string(),
        ))
        .unwrap();

    let response = send(&app, with_bearer(request, &user_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_sets_permissions_and_revokes_sessions() {
    let app = test_app(Some(backup_config()));
    let (user_token, user_refresh) = oauth_login(&app).await;
    let admin = backup_login(&app).await;
    let admin_token = admin["access_token"].as_str().unwrap();

    let me = body_json(send(&app, with_bearer(get("/me"), &user_token)).await).await;
    let user_id = me["user_id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/admin/users/{}/permissions", user_id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"is_admin": false, "permissions": {"billing": ["read"]}}).to_string(),
        ))
        .unwrap();
    let response = send(&app, with_bearer(request, admin_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["permissions"],
        json!({"billing": ["read"]})
    );

    let response = send(
        &app,
        with_bearer(
            post_json(&format!("/admin/users/{}/revoke-sessions", user_id), json!({})),
            admin_token,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["revoked"], 1);

    let response = send(
        &app,
        post_json("/refresh", json!({"refresh_token": user_refresh})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_unknown_user_is_not_found() {
    let app = test_app(Some(backup_config()));
    let admin = backup_login(&app).await;
    let admin_token = admin["access_token"].as_str().unwrap();

    let response = send(
        &app,
        with_bearer(
            post_json(
                &format!("/admin/users/{}/revoke-sessions", uuid::Uuid::new_v4()),
                json!({}),
            ),
            admin_token,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_jwks_endpoint() {
    let app = test_app(None);

    let response = send(&app, get("/.well-known/jwks.json")).await;
    assert_eq!(response.status(), StatusCode::OK);

    // HMAC keys are never published
    assert_eq!(body_json(response).await["keys"], json!([]));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = test_app(None);

    let request = Request::builder()
        .uri("/.well-known/jwks.json")
        .header("X-Request-ID", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.headers()["x-request-id"], "req-123");

    let response = send(&app, get("/.well-known/jwks.json")).await;
    assert!(response.headers().contains_key("x-request-id"));
}

fn test_state(vars: &[(&str, &str)], storage: Arc<RocksDbStorage>) -> AppState {
    let mut env: HashMap<&str, String> = HashMap::new();
    env.insert("JWT_SECRET_KEY", SECRET.to_string());
    for (key, value) in vars {
        env.insert(*key, value.to_string());
    }
    let config = Config::from_lookup(|key| env.get(key).cloned()).unwrap();

    AppState::with_storage(config, storage, ProviderRegistry::new()).unwrap()
}

#[tokio::test]
async fn test_state_sweep_purges_abandoned_logins() {
    let storage = Arc::new(RocksDbStorage::open_test().unwrap());
    let state = test_state(&[("STATE_CACHE_BACKEND", "storage")], Arc::clone(&storage));

    let now = current_timestamp();
    let abandoned = OAuthFlowState {
        nonce: "abandoned".to_string(),
        provider: "github".to_string(),
        client_redirect: FRONTEND_URL.to_string(),
        provider_redirect: "http://localhost:8008/callback/github".to_string(),
        created_at: now - 900,
        expires_at: now - 300,
    };
    storage
        .put(CF_OAUTH_STATES, &abandoned.nonce, &abandoned)
        .await
        .unwrap();

    // The first tick fires immediately
    let sweep = state.spawn_state_sweep().unwrap();

    let mut purged = false;
    for _ in 0..50 {
        if !storage
            .exists(CF_OAUTH_STATES, &abandoned.nonce)
            .await
            .unwrap()
        {
            purged = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    sweep.abort();

    assert!(purged);
}

#[tokio::test]
async fn test_memory_state_backend_has_no_sweep() {
    let storage = Arc::new(RocksDbStorage::open_test().unwrap());
    let state = test_state(&[], storage);

    assert!(state.stored_states.is_none());
    assert!(state.spawn_state_sweep().is_none());
}

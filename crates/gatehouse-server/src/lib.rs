//! # gatehouse-server
//!
//! HTTP surface of the gatehouse credential service: OAuth login and
//! callback, backup login, credential renewal and revocation, and the
//! user and admin endpoints.

pub mod api;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod state;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub use config::Config;
pub use state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        // OAuth
        .route("/login/:provider", get(api::auth::login))
        .route("/callback/:provider", get(api::auth::callback))
        .route("/backup-login", post(api::auth::backup_login))
        // Sessions
        .route("/refresh", post(api::sessions::refresh))
        .route("/logout", post(api::sessions::logout))
        .route("/sessions/revoke-all", post(api::sessions::revoke_all))
        .route("/.well-known/jwks.json", get(api::sessions::jwks_endpoint))
        // Users
        .route("/me", get(api::users::me))
        .route(
            "/admin/users/:user_id/permissions",
            put(api::users::set_permissions),
        )
        .route(
            "/admin/users/:user_id/revoke-sessions",
            post(api::users::revoke_sessions),
        )
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        // Query strings carry codes and state; spans record the path only
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|origin| origin == "*") {
        tracing::warn!("CORS allows any origin");
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

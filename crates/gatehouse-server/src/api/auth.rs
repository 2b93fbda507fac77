use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Redirect, Response},
};
use gatehouse_methods::{AuthMethods, CallbackParams};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::helpers::{TokenResponse, UserResponse};
use crate::{error::ApiError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub client_redirect_uri: Option<String>,
    /// Answer with a redirect to the provider instead of JSON
    #[serde(default)]
    pub redirect: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginInitiateResponse {
    pub auth_url: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct BackupLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenResponse,
    pub user: UserResponse,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /login/:provider
pub async fn login(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, ApiError> {
    let initiation = state
        .auth_methods
        .initiate_login(&provider, query.client_redirect_uri.as_deref())
        .await?;

    if query.redirect {
        return Ok(Redirect::to(&initiation.auth_url).into_response());
    }

    Ok(Json(LoginInitiateResponse {
        auth_url: initiation.auth_url,
        state: initiation.state,
    })
    .into_response())
}

/// GET /callback/:provider
///
/// Always redirects; failures carry `error=oauth_failed`.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let outcome = state.auth_methods.handle_callback(&provider, params).await;
    Redirect::to(outcome.redirect_url())
}

/// POST /backup-login
pub async fn backup_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BackupLoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let login = state
        .auth_methods
        .authenticate_backup(&req.username, &req.password)
        .await?;

    Ok(Json(LoginResponse {
        tokens: login.tokens.into(),
        user: UserResponse::from_user(login.user)?,
    }))
}

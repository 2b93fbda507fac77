use axum::{extract::State, http::StatusCode, response::Json};
use gatehouse_crypto::hash_for_log;
use gatehouse_tokens::{JwksResponse, TokenError, TokenManager};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::helpers::TokenResponse;
use crate::{error::ApiError, extractors::AuthenticatedUser, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RevokeAllResponse {
    pub revoked: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let pair = state
        .tokens
        .renew_token_pair(&req.refresh_token)
        .await
        .map_err(|e| {
            tracing::info!(
                token_hash = %hash_for_log(&req.refresh_token),
                error = %e,
                "Refresh rejected"
            );
            ApiError::from_refresh_error(e)
        })?;

    Ok(Json(pair.into()))
}

/// POST /logout
///
/// Unknown and already-revoked tokens are not errors.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<StatusCode, ApiError> {
    match state.tokens.revoke_refresh_token(&req.refresh_token).await {
        Ok(()) | Err(TokenError::NotFound) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(ApiError::from_refresh_error(e)),
    }
}

/// POST /sessions/revoke-all
pub async fn revoke_all(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<Json<RevokeAllResponse>, ApiError> {
    let user_id = auth.user_id()?;

    let revoked = state
        .tokens
        .revoke_all_for_user(user_id)
        .await
        .map_err(ApiError::from_refresh_error)?;

    Ok(Json(RevokeAllResponse { revoked }))
}

/// GET /.well-known/jwks.json
pub async fn jwks_endpoint(State(state): State<Arc<AppState>>) -> Json<JwksResponse> {
    Json(state.tokens.jwks())
}

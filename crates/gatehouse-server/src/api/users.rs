use axum::{
    extract::{Path, State},
    response::Json,
};
use gatehouse_identity::{Permissions, UserDirectory};
use gatehouse_tokens::TokenManager;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{helpers::UserResponse, sessions::RevokeAllResponse};
use crate::{
    error::ApiError,
    extractors::{AdminUser, AuthenticatedUser},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SetPermissionsRequest {
    pub is_admin: bool,
    #[serde(default)]
    pub permissions: Permissions,
}

/// GET /me
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.get_user(auth.user_id()?).await?;
    Ok(Json(UserResponse::from_user(user)?))
}

/// PUT /admin/users/:user_id/permissions
///
/// Takes effect on the user's next login or renewal.
pub async fn set_permissions(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SetPermissionsRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .set_permissions(user_id, req.is_admin, req.permissions)
        .await?;

    tracing::info!(
        admin = %admin.claims.sub,
        user_id = %user_id,
        is_admin = user.is_admin,
        "User permissions updated"
    );

    Ok(Json(UserResponse::from_user(user)?))
}

/// POST /admin/users/:user_id/revoke-sessions
pub async fn revoke_sessions(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<RevokeAllResponse>, ApiError> {
    // Surface unknown users as 404 rather than a zero count
    state.users.get_user(user_id).await?;

    let revoked = state
        .tokens
        .revoke_all_for_user(user_id)
        .await
        .map_err(ApiError::from_refresh_error)?;

    tracing::info!(
        admin = %admin.claims.sub,
        user_id = %user_id,
        revoked,
        "User sessions revoked"
    );

    Ok(Json(RevokeAllResponse { revoked }))
}

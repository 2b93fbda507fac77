use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use gatehouse_tokens::{AccessClaims, TokenManager};
use std::sync::Arc;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Extractor for authenticated requests
///
/// Validates the bearer access token's signature and expiry. No store
/// lookup is made.
pub struct AuthenticatedUser {
    pub claims: AccessClaims,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> Result<Uuid, ApiError> {
        self.claims.user_id().map_err(|_| ApiError::InvalidToken)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let claims = state.tokens.validate_access_token(token).map_err(|e| {
            tracing::debug!("Access token rejected: {}", e);
            ApiError::from_access_error(e)
        })?;

        Ok(AuthenticatedUser { claims })
    }
}

/// Authenticated user whose token carries the administrator flag
pub struct AdminUser {
    pub claims: AccessClaims,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser { claims } =
            AuthenticatedUser::from_request_parts(parts, state).await?;

        if !claims.is_admin {
            tracing::warn!(user_id = %claims.sub, "Non-admin attempted an admin operation");
            return Err(ApiError::Forbidden("Administrator access required".to_string()));
        }

        Ok(AdminUser { claims })
    }
}

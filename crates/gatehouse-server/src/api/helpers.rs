use gatehouse_identity::{Permissions, User};
use gatehouse_tokens::TokenPair;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

pub fn format_timestamp_rfc3339(timestamp: u64) -> Result<String, ApiError> {
    Ok(chrono::DateTime::from_timestamp(timestamp as i64, 0)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Invalid timestamp")))?
        .to_rfc3339())
}

/// Public view of a user record
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub provider: String,
    pub username: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub permissions: Permissions,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

impl UserResponse {
    pub fn from_user(user: User) -> Result<Self, ApiError> {
        Ok(Self {
            created_at: format_timestamp_rfc3339(user.created_at)?,
            last_login_at: user
                .last_login_at
                .map(format_timestamp_rfc3339)
                .transpose()?,
            user_id: user.user_id,
            provider: user.provider,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            is_admin: user.is_admin,
            permissions: user.permissions,
        })
    }
}

/// Credential pair as returned to clients
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_expires_in: u64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: pair.token_type,
            expires_in: pair.expires_in,
            refresh_expires_in: pair.refresh_expires_in,
        }
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gatehouse_identity::IdentityError;
use gatehouse_methods::AuthMethodsError;
use gatehouse_tokens::TokenError;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid provider: {0}")]
    InvalidProvider(String),

    #[error("Redirect not allowed")]
    RedirectNotAllowed,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Access token past its expiry; the client should renew
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Refresh token not found")]
    RefreshTokenNotFound,

    #[error("Refresh token revoked")]
    RefreshTokenRevoked,

    #[error("Refresh token expired")]
    RefreshTokenExpired,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backup login disabled")]
    BackupLoginDisabled,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Map a failure of a refresh-token operation
    pub fn from_refresh_error(err: TokenError) -> Self {
        match err {
            TokenError::NotFound => ApiError::RefreshTokenNotFound,
            TokenError::Revoked => ApiError::RefreshTokenRevoked,
            TokenError::Expired => ApiError::RefreshTokenExpired,
            // Owner of a live refresh token no longer exists
            TokenError::UserNotFound(_) => ApiError::RefreshTokenRevoked,
            other => ApiError::Internal(other.into()),
        }
    }

    /// Map a failure to validate an access token
    pub fn from_access_error(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::TokenExpired,
            TokenError::SignatureInvalid => ApiError::InvalidToken,
            other => ApiError::Internal(other.into()),
        }
    }
}

impl From<AuthMethodsError> for ApiError {
    fn from(err: AuthMethodsError) -> Self {
        match err {
            AuthMethodsError::InvalidProvider(provider) => ApiError::InvalidProvider(provider),
            AuthMethodsError::RedirectNotAllowed(_) => ApiError::RedirectNotAllowed,
            AuthMethodsError::Unauthorized => ApiError::Unauthorized,
            AuthMethodsError::BackupLoginDisabled => ApiError::BackupLoginDisabled,
            other => ApiError::Internal(other.into()),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotFound(user_id) => ApiError::NotFound(format!("user {}", user_id)),
            IdentityError::InvalidProfile(msg) => ApiError::InvalidRequest(msg),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::InvalidProvider(provider) => (
                StatusCode::BAD_REQUEST,
                "INVALID_PROVIDER",
                format!("Unknown or unconfigured provider: {}", provider),
            ),
            ApiError::RedirectNotAllowed => (
                StatusCode::BAD_REQUEST,
                "REDIRECT_NOT_ALLOWED",
                "Redirect target is not allowed".to_string(),
            ),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "Access token has expired".to_string(),
            ),
            ApiError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Access token is invalid".to_string(),
            ),
            ApiError::RefreshTokenNotFound => (
                StatusCode::UNAUTHORIZED,
                "REFRESH_TOKEN_NOT_FOUND",
                "Refresh token not recognised".to_string(),
            ),
            ApiError::RefreshTokenRevoked => (
                StatusCode::UNAUTHORIZED,
                "REFRESH_TOKEN_REVOKED",
                "Refresh token has been revoked".to_string(),
            ),
            ApiError::RefreshTokenExpired => (
                StatusCode::UNAUTHORIZED,
                "REFRESH_TOKEN_EXPIRED",
                "Refresh token has expired".to_string(),
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Missing or invalid credentials".to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BackupLoginDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "BACKUP_LOGIN_DISABLED",
                "Backup login is not configured".to_string(),
            ),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetails {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

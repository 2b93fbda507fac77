use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TokenError {
    /// Bad signature, wrong algorithm, issuer, audience or token type, or not a JWT at all
    #[error("Invalid token signature")]
    SignatureInvalid,

    /// Access token past `exp`, or refresh record past `expires_at`
    #[error("Token expired")]
    Expired,

    #[error("Refresh token not found")]
    NotFound,

    #[error("Refresh token revoked")]
    Revoked,

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Invalid token configuration: {0}")]
    InvalidConfig(String),

    #[error("JWT encoding error: {0}")]
    JwtEncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] gatehouse_storage::StorageError),

    #[error("Identity error: {0}")]
    IdentityError(gatehouse_identity::IdentityError),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<gatehouse_identity::IdentityError> for TokenError {
    fn from(err: gatehouse_identity::IdentityError) -> Self {
        match err {
            gatehouse_identity::IdentityError::NotFound(user_id) => TokenError::UserNotFound(user_id),
            other => TokenError::IdentityError(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, TokenError>;

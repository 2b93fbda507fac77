//! Error types for the login methods.

use thiserror::Error;

/// Errors that can occur during OAuth or backup login
#[derive(Error, Debug)]
pub enum AuthMethodsError {
    /// Provider name is not one of the configured adapters
    #[error("Unknown or unconfigured provider: {0}")]
    InvalidProvider(String),

    /// State token is malformed, unknown, expired or already consumed
    #[error("Invalid or expired OAuth state")]
    InvalidOrExpiredState,

    /// Code exchange or user-info fetch failed (network, timeout, provider rejection)
    #[error("OAuth provider exchange failed: {0}")]
    ProviderExchangeFailed(String),

    /// Backup login rejected. Never says which factor was wrong.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Backup login is not configured")]
    BackupLoginDisabled,

    #[error("Redirect target not allowed: {0}")]
    RedirectNotAllowed(String),

    #[error("Backup login configuration invalid: {0}")]
    BackupConfigInvalid(String),

    #[error("OAuth configuration invalid: {0}")]
    OAuthConfigInvalid(String),

    #[error("Token error: {0}")]
    Token(#[from] gatehouse_tokens::TokenError),

    #[error("Identity error: {0}")]
    Identity(#[from] gatehouse_identity::IdentityError),

    #[error("Storage error: {0}")]
    Storage(#[from] gatehouse_storage::StorageError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] gatehouse_crypto::CryptoError),
}

pub type Result<T> = std::result::Result<T, AuthMethodsError>;

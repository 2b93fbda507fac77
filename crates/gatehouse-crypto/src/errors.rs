//! Cryptographic error types.

use thiserror::Error;

/// Cryptographic operation errors
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Argon2 hashing failed
    #[error("Argon2 hashing failed: {0}")]
    Argon2Failed(String),

    /// Invalid hash format
    #[error("Invalid hash format")]
    InvalidHashFormat,

    /// Password did not match the stored hash
    #[error("Password mismatch")]
    PasswordMismatch,

    /// Invalid encoded input
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
}

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;

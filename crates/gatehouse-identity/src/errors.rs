//! Identity error types.

use thiserror::Error;
use uuid::Uuid;

/// User directory errors
#[derive(Debug, Error)]
pub enum IdentityError {
    /// User not found
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Provider profile is missing a required field
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Concurrent writers kept changing the record
    #[error("Update conflict for user {0}")]
    UpdateConflict(Uuid),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] gatehouse_storage::StorageError),
}

/// Result type for identity operations
pub type Result<T> = std::result::Result<T, IdentityError>;

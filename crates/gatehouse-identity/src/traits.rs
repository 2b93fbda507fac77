//! User directory trait definitions.

use crate::{errors::Result, types::*};
use async_trait::async_trait;
use uuid::Uuid;

/// User directory
///
/// Every call reads from the store of record. Implementations must not
/// cache `User` values across calls.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Get user by ID
    async fn get_user(&self, user_id: Uuid) -> Result<User>;

    /// Find a user by (provider, external id)
    async fn find_by_provider(&self, provider: &str, external_id: &str) -> Result<Option<User>>;

    /// Find a user by email (case-insensitive). Used for backup login matching only.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Create or refresh the user for a provider identity.
    ///
    /// Existing users get their profile fields refreshed and `last_login_at`
    /// stamped; admin flag and permissions are left untouched. New users are
    /// created with `is_admin = false` and no permissions.
    async fn upsert_oauth_user(&self, profile: ProviderProfile) -> Result<User>;

    /// Load or create the user for a backup account and apply its configured
    /// admin flag and permissions.
    async fn upsert_backup_user(&self, account: &BackupAccount) -> Result<User>;

    /// Replace a user's admin flag and permission set
    async fn set_permissions(
        &self,
        user_id: Uuid,
        is_admin: bool,
        permissions: Permissions,
    ) -> Result<User>;
}

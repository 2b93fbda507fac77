//! User directory service implementation.

use crate::{errors::*, traits::*, types::*};
use async_trait::async_trait;
use gatehouse_storage::{Storage, CF_USERS, CF_USERS_BY_EMAIL, CF_USERS_BY_PROVIDER};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

mod admin;

/// Compare-and-swap attempts before an update gives up
const MAX_UPDATE_ATTEMPTS: usize = 16;
mod login;

/// Storage-backed user directory
pub struct UserService<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage + 'static> UserService<S> {
    /// Create a new user service
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    async fn get_user_internal(&self, user_id: Uuid) -> Result<User> {
        self.storage
            .get(CF_USERS, &user_id)
            .await?
            .ok_or(IdentityError::NotFound(user_id))
    }

    async fn find_by_provider_internal(
        &self,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<User>> {
        let key = provider_key(provider, external_id);
        let user_id: Option<Uuid> = self.storage.get(CF_USERS_BY_PROVIDER, &key).await?;

        match user_id {
            Some(user_id) => Ok(self.storage.get(CF_USERS, &user_id).await?),
            None => Ok(None),
        }
    }

    async fn find_by_email_internal(&self, email: &str) -> Result<Option<User>> {
        let user_id: Option<Uuid> = self.storage.get(CF_USERS_BY_EMAIL, &email_key(email)).await?;

        match user_id {
            Some(user_id) => Ok(self.storage.get(CF_USERS, &user_id).await?),
            None => Ok(None),
        }
    }

    /// Apply `change` to the stored user.
    ///
    /// The write is a compare-and-swap against the record `change` saw, so a
    /// field set by a concurrent writer is never overwritten with a stale copy.
    async fn update_user<F>(&self, user_id: Uuid, change: F) -> Result<User>
    where
        F: Fn(&mut User) + Send + Sync,
    {
        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let current = self.get_user_internal(user_id).await?;
            let mut updated = current.clone();
            change(&mut updated);

            if self
                .storage
                .compare_and_swap(CF_USERS, &user_id, &current, &updated)
                .await?
            {
                self.index_email(&updated, current.email.as_deref()).await?;
                return Ok(updated);
            }

            debug!(user_id = %user_id, "User changed concurrently, retrying update");
        }

        Err(IdentityError::UpdateConflict(user_id))
    }

    /// Keep the email index pointing at `user`.
    ///
    /// The first user to claim an email keeps the index entry.
    async fn index_email(&self, user: &User, previous_email: Option<&str>) -> Result<()> {
        let previous = previous_email.map(email_key);
        let current = user.email.as_deref().map(email_key);
        if previous == current {
            return Ok(());
        }

        if let Some(previous) = previous {
            let owner: Option<Uuid> = self.storage.get(CF_USERS_BY_EMAIL, &previous).await?;
            if owner == Some(user.user_id) {
                self.storage.delete(CF_USERS_BY_EMAIL, &previous).await?;
            }
        }

        if let Some(current) = current {
            self.storage
                .put_if_absent(CF_USERS_BY_EMAIL, &current, &user.user_id)
                .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl<S: Storage + 'static> UserDirectory for UserService<S> {
    async fn get_user(&self, user_id: Uuid) -> Result<User> {
        self.get_user_internal(user_id).await
    }

    async fn find_by_provider(&self, provider: &str, external_id: &str) -> Result<Option<User>> {
        self.find_by_provider_internal(provider, external_id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_by_email_internal(email).await
    }

    async fn upsert_oauth_user(&self, profile: ProviderProfile) -> Result<User> {
        self.upsert_profile_internal(profile).await
    }

    async fn upsert_backup_user(&self, account: &BackupAccount) -> Result<User> {
        self.upsert_backup_user_internal(account).await
    }

    async fn set_permissions(
        &self,
        user_id: Uuid,
        is_admin: bool,
        permissions: Permissions,
    ) -> Result<User> {
        self.set_permissions_internal(user_id, is_admin, permissions)
            .await
    }
}

//! Login-time user upserts.

use crate::{errors::*, types::*};
use gatehouse_storage::{Storage, CF_USERS, CF_USERS_BY_PROVIDER};
use tracing::{debug, info};
use uuid::Uuid;

use super::UserService;

impl<S: Storage + 'static> UserService<S> {
    /// Create or refresh the user behind a provider identity
    pub(crate) async fn upsert_profile_internal(&self, profile: ProviderProfile) -> Result<User> {
        Self::validate_profile(&profile)?;
        let now = current_timestamp();

        if let Some(user) = self
            .find_by_provider_internal(&profile.provider, &profile.external_id)
            .await?
        {
            return self.refresh_user(user.user_id, &profile, now).await;
        }

        let user = Self::build_user(&profile, now);
        self.storage.put(CF_USERS, &user.user_id, &user).await?;

        let key = provider_key(&profile.provider, &profile.external_id);
        if !self
            .storage
            .put_if_absent(CF_USERS_BY_PROVIDER, &key, &user.user_id)
            .await?
        {
            // A concurrent first login claimed the identity
            self.storage.delete(CF_USERS, &user.user_id).await?;

            let winner: Uuid = self
                .storage
                .get(CF_USERS_BY_PROVIDER, &key)
                .await?
                .ok_or_else(|| {
                    IdentityError::InvalidProfile(format!("provider index vanished for {}", key))
                })?;
            return self.refresh_user(winner, &profile, now).await;
        }

        self.index_email(&user, None).await?;

        info!(
            user_id = %user.user_id,
            provider = %user.provider,
            "Created user on first login"
        );
        Ok(user)
    }

    /// Load or create the backup-login user and apply its configuration
    pub(crate) async fn upsert_backup_user_internal(&self, account: &BackupAccount) -> Result<User> {
        if let Some(email) = account.email.as_deref() {
            if let Some(user) = self.find_by_email_internal(email).await? {
                debug!(user_id = %user.user_id, "Backup account matched existing user by email");
                return self.apply_backup_account(user.user_id, account).await;
            }
        }

        let profile = ProviderProfile {
            provider: BACKUP_PROVIDER.to_string(),
            external_id: account.username.clone(),
            email: account.email.clone(),
            username: format!("backup_{}", account.username),
            display_name: Some(account.username.clone()),
            avatar_url: None,
        };

        let user = self.upsert_profile_internal(profile).await?;
        self.apply_backup_account(user.user_id, account).await
    }

    async fn apply_backup_account(&self, user_id: Uuid, account: &BackupAccount) -> Result<User> {
        let now = current_timestamp();
        self.update_user(user_id, |user| {
            user.is_admin = account.is_admin;
            user.permissions = account.permissions.clone();
            user.last_login_at = Some(now);
            user.updated_at = now;
        })
        .await
    }

    /// Copy mutable profile fields; admin flag and permissions are left alone
    async fn refresh_user(&self, user_id: Uuid, profile: &ProviderProfile, now: u64) -> Result<User> {
        let user = self
            .update_user(user_id, |user| {
                user.email = profile.email.clone();
                user.username = profile.username.clone();
                user.display_name = profile.display_name.clone();
                user.avatar_url = profile.avatar_url.clone();
                user.last_login_at = Some(now);
                user.updated_at = now;
            })
            .await?;

        debug!(user_id = %user.user_id, provider = %user.provider, "Refreshed user profile");
        Ok(user)
    }

    fn build_user(profile: &ProviderProfile, now: u64) -> User {
        User {
            user_id: Uuid::new_v4(),
            provider: profile.provider.clone(),
            external_id: profile.external_id.clone(),
            email: profile.email.clone(),
            username: profile.username.clone(),
            display_name: profile.display_name.clone(),
            avatar_url: profile.avatar_url.clone(),
            is_admin: false,
            permissions: Permissions::new(),
            created_at: now,
            updated_at: now,
            last_login_at: Some(now),
        }
    }

    fn validate_profile(profile: &ProviderProfile) -> Result<()> {
        if profile.provider.is_empty() {
            return Err(IdentityError::InvalidProfile("provider is empty".to_string()));
        }
        if profile.external_id.is_empty() {
            return Err(IdentityError::InvalidProfile(
                "external id is empty".to_string(),
            ));
        }
        Ok(())
    }
}

//! Backup login.

use crate::{errors::*, events::SecurityEvent, types::*};
use gatehouse_crypto::{hash_for_log, verify_password};
use gatehouse_identity::UserDirectory;
use gatehouse_tokens::TokenManager;
use tracing::info;

use super::AuthMethodsService;

impl<U, T> AuthMethodsService<U, T>
where
    U: UserDirectory + 'static,
    T: TokenManager + 'static,
{
    pub(super) async fn authenticate_backup_internal(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome> {
        let backup_users = self
            .backup_users
            .as_ref()
            .ok_or(AuthMethodsError::BackupLoginDisabled)?;

        // Unknown usernames verify against the dummy hash so both paths cost the same
        let credential = backup_users.get(username);
        let password_hash = credential
            .map(|c| c.password_hash.as_str())
            .unwrap_or_else(|| backup_users.dummy_hash());
        let password_valid = verify_password(password.as_bytes(), password_hash).is_ok();

        let credential = match credential {
            Some(credential) if password_valid => credential,
            _ => {
                self.security_events
                    .record(SecurityEvent::BackupLoginFailed {
                        username_hash: hash_for_log(username),
                    })
                    .await;
                return Err(AuthMethodsError::Unauthorized);
            }
        };

        let user = self.users.upsert_backup_user(&credential.account).await?;
        let tokens = self.tokens.issue_token_pair(&user).await?;

        info!(user_id = %user.user_id, "Backup login completed");
        self.security_events
            .record(SecurityEvent::BackupLoginSucceeded {
                user_id: user.user_id,
            })
            .await;

        Ok(LoginOutcome { user, tokens })
    }
}

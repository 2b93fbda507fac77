//! Token lifecycle operations: issue, renew, revoke.

use crate::{errors::*, types::*, EventPublisher};
use gatehouse_crypto::sha256;
use gatehouse_identity::{User, UserDirectory};
use gatehouse_storage::{
    Storage, CF_REFRESH_TOKENS, CF_REFRESH_TOKENS_BY_FAMILY, CF_REFRESH_TOKENS_BY_USER,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::TokenService;

impl<S, U, E> TokenService<S, U, E>
where
    S: Storage + 'static,
    U: UserDirectory + 'static,
    E: EventPublisher + 'static,
{
    /// Issue a pair that starts a new refresh family
    pub(crate) async fn issue_token_pair_internal(&self, user: &User) -> Result<TokenPair> {
        let family_id = Uuid::new_v4();
        let pair = self
            .issue_pair(user, family_id, 1, current_timestamp())
            .await?;

        info!(user_id = %user.user_id, family_id = %family_id, "Issued token pair");
        Ok(pair)
    }

    /// Rotate a refresh token.
    ///
    /// The presented record is revoked with a compare-and-swap against the
    /// exact record that was read, so of two concurrent renewals with the same
    /// value only one can win.
    pub(crate) async fn renew_token_pair_internal(&self, refresh_token: &str) -> Result<TokenPair> {
        let token_hash = sha256(refresh_token.as_bytes());
        let record = self.get_refresh_token_record(&token_hash).await?;
        let now = current_timestamp();

        if record.revoked {
            if record.revoked_reason == Some(RevocationReason::Rotated) {
                self.handle_token_reuse(&record).await?;
            }
            return Err(TokenError::Revoked);
        }

        if record.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        let rotated = record.revoked_copy(RevocationReason::Rotated, now);
        if !self
            .storage
            .compare_and_swap(CF_REFRESH_TOKENS, &token_hash, &record, &rotated)
            .await?
        {
            debug!(family_id = %record.family_id, "Refresh token rotated concurrently");
            return Err(TokenError::Revoked);
        }

        // Re-read so permission changes since the last issue take effect
        let user = self.users.get_user(record.user_id).await?;

        let pair = self
            .issue_pair(&user, record.family_id, record.generation + 1, now)
            .await?;

        info!(
            user_id = %user.user_id,
            family_id = %record.family_id,
            generation = record.generation + 1,
            "Rotated refresh token"
        );
        Ok(pair)
    }

    /// Revoke a single refresh token
    pub(crate) async fn revoke_refresh_token_internal(&self, refresh_token: &str) -> Result<()> {
        let token_hash = sha256(refresh_token.as_bytes());
        let record = self.get_refresh_token_record(&token_hash).await?;

        if record.revoked {
            debug!(family_id = %record.family_id, "Refresh token already revoked");
            return Ok(());
        }

        let revoked = record.revoked_copy(RevocationReason::Logout, current_timestamp());
        if !self
            .storage
            .compare_and_swap(CF_REFRESH_TOKENS, &token_hash, &record, &revoked)
            .await?
        {
            // The only other transition is to revoked
            debug!(family_id = %record.family_id, "Refresh token revoked concurrently");
        }

        info!(user_id = %record.user_id, family_id = %record.family_id, "Refresh token revoked");
        Ok(())
    }

    /// Revoke every live refresh token of a user
    pub(crate) async fn revoke_all_for_user_internal(&self, user_id: Uuid) -> Result<usize> {
        let index: Vec<(Vec<u8>, [u8; 32])> = self
            .storage
            .get_by_prefix(CF_REFRESH_TOKENS_BY_USER, &user_id)
            .await?;

        let hashes = index.into_iter().map(|(_, hash)| hash);
        let revoked_count = self
            .revoke_records(hashes, RevocationReason::SecurityEvent)
            .await?;

        info!(user_id = %user_id, revoked_count, "Revoked all refresh tokens for user");

        self.event_publisher
            .publish_revocation_event(RevocationEvent {
                event_type: RevocationEventType::AllUserTokensRevoked,
                user_id,
                family_id: None,
                revoked_count,
                timestamp: current_timestamp(),
                reason: Some("All refresh tokens revoked".to_string()),
            })
            .await?;

        Ok(revoked_count)
    }

    /// A token revoked by rotation was presented again: revoke its whole family
    async fn handle_token_reuse(&self, record: &RefreshTokenRecord) -> Result<()> {
        let index: Vec<(Vec<u8>, [u8; 32])> = self
            .storage
            .get_by_prefix(CF_REFRESH_TOKENS_BY_FAMILY, &record.family_id)
            .await?;

        let hashes = index.into_iter().map(|(_, hash)| hash);
        let revoked_count = self
            .revoke_records(hashes, RevocationReason::ReuseDetected)
            .await?;

        warn!(
            user_id = %record.user_id,
            family_id = %record.family_id,
            generation = record.generation,
            revoked_count,
            "Refresh token reuse detected, family revoked"
        );

        self.event_publisher
            .publish_revocation_event(RevocationEvent {
                event_type: RevocationEventType::RefreshTokenReuse,
                user_id: record.user_id,
                family_id: Some(record.family_id),
                revoked_count,
                timestamp: current_timestamp(),
                reason: Some("Refresh token reuse detected".to_string()),
            })
            .await
    }

    /// Mark every live (unrevoked, unexpired) record revoked
    async fn revoke_records<I>(&self, hashes: I, reason: RevocationReason) -> Result<usize>
    where
        I: IntoIterator<Item = [u8; 32]> + Send,
        I::IntoIter: Send,
    {
        let now = current_timestamp();
        let mut revoked_count = 0;

        for token_hash in hashes {
            let record: Option<RefreshTokenRecord> =
                self.storage.get(CF_REFRESH_TOKENS, &token_hash).await?;
            let Some(record) = record else {
                continue;
            };

            if record.revoked || record.is_expired_at(now) {
                continue;
            }

            let revoked = record.revoked_copy(reason, now);
            if self
                .storage
                .compare_and_swap(CF_REFRESH_TOKENS, &token_hash, &record, &revoked)
                .await?
            {
                revoked_count += 1;
            }
        }

        Ok(revoked_count)
    }

    async fn issue_pair(
        &self,
        user: &User,
        family_id: Uuid,
        generation: u32,
        now: u64,
    ) -> Result<TokenPair> {
        let access_token = self.issue_access_token(user, now)?;
        let refresh_token = self
            .generate_refresh_token(user.user_id, family_id, generation, now)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl,
            refresh_expires_in: self.refresh_token_ttl,
            user_id: user.user_id,
        })
    }
}

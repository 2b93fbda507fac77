//! Token service implementation.

mod keys;
mod lifecycle;
mod tokens;

use crate::{errors::*, traits::*, types::*, EventPublisher, NoOpEventPublisher};
use async_trait::async_trait;
use gatehouse_identity::{User, UserDirectory};
use gatehouse_storage::{Storage, CF_REFRESH_TOKENS};
use std::sync::Arc;
use uuid::Uuid;

use keys::SigningKeys;

/// Token service implementation
///
/// Holds no per-user state in memory: every refresh decision re-reads the
/// record from storage so revocations are visible across instances.
pub struct TokenService<S: Storage, U: UserDirectory, E: EventPublisher> {
    pub(super) storage: Arc<S>,
    pub(super) users: Arc<U>,
    pub(super) event_publisher: Arc<E>,
    pub(super) issuer: String,
    pub(super) audience: String,
    pub(super) access_token_ttl: u64,  // seconds
    pub(super) refresh_token_ttl: u64, // seconds
    pub(super) keys: SigningKeys,
}

impl<S, U> TokenService<S, U, NoOpEventPublisher>
where
    S: Storage + 'static,
    U: UserDirectory + 'static,
{
    /// Create a new token service with no event publisher
    pub fn new(storage: Arc<S>, users: Arc<U>, config: TokenConfig) -> Result<Self> {
        Self::with_event_publisher(storage, users, Arc::new(NoOpEventPublisher), config)
    }
}

impl<S, U, E> TokenService<S, U, E>
where
    S: Storage + 'static,
    U: UserDirectory + 'static,
    E: EventPublisher + 'static,
{
    /// Create a new token service with custom event publisher
    pub fn with_event_publisher(
        storage: Arc<S>,
        users: Arc<U>,
        event_publisher: Arc<E>,
        config: TokenConfig,
    ) -> Result<Self> {
        if config.issuer.is_empty() || config.audience.is_empty() {
            return Err(TokenError::InvalidConfig(
                "issuer and audience must be set".to_string(),
            ));
        }

        let keys = SigningKeys::from_config(&config.signing_key)?;

        Ok(Self {
            storage,
            users,
            event_publisher,
            issuer: config.issuer,
            audience: config.audience,
            access_token_ttl: config.access_token_ttl,
            refresh_token_ttl: config.refresh_token_ttl,
            keys,
        })
    }

    /// Access token lifetime in seconds
    pub fn access_token_ttl(&self) -> u64 {
        self.access_token_ttl
    }

    /// Get refresh token record
    pub(super) async fn get_refresh_token_record(
        &self,
        token_hash: &[u8; 32],
    ) -> Result<RefreshTokenRecord> {
        self.storage
            .get(CF_REFRESH_TOKENS, token_hash)
            .await?
            .ok_or(TokenError::NotFound)
    }
}

#[async_trait]
impl<S, U, E> TokenManager for TokenService<S, U, E>
where
    S: Storage + 'static,
    U: UserDirectory + 'static,
    E: EventPublisher + 'static,
{
    async fn issue_token_pair(&self, user: &User) -> Result<TokenPair> {
        self.issue_token_pair_internal(user).await
    }

    fn validate_access_token(&self, token: &str) -> Result<AccessClaims> {
        self.validate_access_token_at(token, current_timestamp())
    }

    async fn renew_token_pair(&self, refresh_token: &str) -> Result<TokenPair> {
        self.renew_token_pair_internal(refresh_token).await
    }

    async fn revoke_refresh_token(&self, refresh_token: &str) -> Result<()> {
        self.revoke_refresh_token_internal(refresh_token).await
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<usize> {
        self.revoke_all_for_user_internal(user_id).await
    }

    fn jwks(&self) -> JwksResponse {
        self.keys.jwks()
    }
}

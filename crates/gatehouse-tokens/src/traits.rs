use crate::{AccessClaims, JwksResponse, Result, RevocationEvent, TokenPair};
use async_trait::async_trait;
use gatehouse_identity::User;
use uuid::Uuid;

/// Token manager trait for credential issuance and lifecycle
#[async_trait]
pub trait TokenManager: Send + Sync {
    /// Issue a new access/refresh pair starting a new refresh family
    async fn issue_token_pair(&self, user: &User) -> Result<TokenPair>;

    /// Verify an access token's signature and expiry. Never touches storage.
    fn validate_access_token(&self, token: &str) -> Result<AccessClaims>;

    /// Exchange a refresh token for a new pair, revoking the presented one
    async fn renew_token_pair(&self, refresh_token: &str) -> Result<TokenPair>;

    /// Revoke a refresh token (logout). Revoking twice is not an error.
    async fn revoke_refresh_token(&self, refresh_token: &str) -> Result<()>;

    /// Revoke every live refresh token of a user, returning how many were revoked
    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<usize>;

    /// Get JWKS for public key distribution
    fn jwks(&self) -> JwksResponse;
}

/// Event publisher trait for revocation and security events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a revocation event
    async fn publish_revocation_event(&self, event: RevocationEvent) -> Result<()>;
}

/// No-op event publisher for testing
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_revocation_event(&self, _event: RevocationEvent) -> Result<()> {
        Ok(())
    }
}

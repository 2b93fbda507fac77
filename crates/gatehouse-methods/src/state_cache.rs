//! Ephemeral store for OAuth flow state.

use crate::errors::*;
use crate::oauth::OAuthFlowState;
use async_trait::async_trait;
use gatehouse_crypto::current_timestamp;
use gatehouse_storage::{Batch, Storage, CF_OAUTH_STATES};
use tracing::debug;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on in-flight logins held by the in-memory cache
const MAX_PENDING_STATES: u64 = 100_000;

/// TTL-bound, single-use storage for OAuth flow state
#[async_trait]
pub trait StateCache: Send + Sync {
    /// Store a flow state under its nonce
    async fn put(&self, state: OAuthFlowState) -> Result<()>;

    /// Remove and return the flow state for `nonce`.
    ///
    /// Atomic: of any number of concurrent calls for the same nonce at most
    /// one returns `Some`. Expired entries are never returned.
    async fn take(&self, nonce: &str) -> Result<Option<OAuthFlowState>>;
}

/// In-process cache. Flow state does not survive a restart and is not
/// shared between instances.
pub struct MokaStateCache {
    cache: Cache<String, OAuthFlowState>,
}

impl MokaStateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(MAX_PENDING_STATES)
                .build(),
        }
    }
}

#[async_trait]
impl StateCache for MokaStateCache {
    async fn put(&self, state: OAuthFlowState) -> Result<()> {
        self.cache.insert(state.nonce.clone(), state).await;
        Ok(())
    }

    async fn take(&self, nonce: &str) -> Result<Option<OAuthFlowState>> {
        let state = self.cache.remove(nonce).await;
        Ok(state.filter(|s| !s.is_expired_at(current_timestamp())))
    }
}

/// Flow state kept in the `oauth_states` column family
///
/// Survives restarts and is visible to every instance sharing the store.
/// States abandoned before their callback stay until [`purge_expired`]
/// removes them.
///
/// [`purge_expired`]: StorageStateCache::purge_expired
pub struct StorageStateCache<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> StorageStateCache<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Delete every stored state expired at `now`, returning how many went
    pub async fn purge_expired_at(&self, now: u64) -> Result<usize> {
        // The unit key encodes to no bytes, so the scan covers the whole family
        let states: Vec<(Vec<u8>, OAuthFlowState)> =
            self.storage.get_by_prefix(CF_OAUTH_STATES, &()).await?;

        let mut batch = self.storage.batch();
        let mut purged = 0;
        for (key, state) in states {
            if state.is_expired_at(now) {
                batch.delete_raw(CF_OAUTH_STATES, key)?;
                purged += 1;
            }
        }

        if purged > 0 {
            batch.commit().await?;
            debug!(purged, "Purged expired OAuth flow states");
        }

        Ok(purged)
    }

    pub async fn purge_expired(&self) -> Result<usize> {
        self.purge_expired_at(current_timestamp()).await
    }
}

#[async_trait]
impl<S: Storage + 'static> StateCache for StorageStateCache<S> {
    async fn put(&self, state: OAuthFlowState) -> Result<()> {
        self.storage
            .put(CF_OAUTH_STATES, &state.nonce, &state)
            .await?;
        Ok(())
    }

    async fn take(&self, nonce: &str) -> Result<Option<OAuthFlowState>> {
        let state: Option<OAuthFlowState> = self
            .storage
            .take(CF_OAUTH_STATES, &nonce.to_string())
            .await?;
        Ok(state.filter(|s| !s.is_expired_at(current_timestamp())))
    }
}

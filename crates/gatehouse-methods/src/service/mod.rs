//! Login methods service implementation.

mod backup;
mod oauth;

use crate::{
    backup::BackupUsers,
    errors::*,
    events::{SecurityEventSink, TracingSecurityEventSink},
    oauth::ProviderRegistry,
    redirect::RedirectPolicy,
    state_cache::StateCache,
    traits::AuthMethods,
    types::*,
};
use async_trait::async_trait;
use gatehouse_identity::UserDirectory;
use gatehouse_tokens::TokenManager;
use std::sync::Arc;

/// Default OAuth flow state lifetime: 10 minutes
pub const DEFAULT_STATE_TTL: u64 = 10 * 60;

/// OAuth flow controller and backup login handler
pub struct AuthMethodsService<U: UserDirectory, T: TokenManager> {
    pub(super) users: Arc<U>,
    pub(super) tokens: Arc<T>,
    pub(super) state_cache: Arc<dyn StateCache>,
    pub(super) providers: ProviderRegistry,
    pub(super) redirects: RedirectPolicy,
    pub(super) backup_users: Option<BackupUsers>,
    pub(super) security_events: Arc<dyn SecurityEventSink>,
    pub(super) state_ttl: u64, // seconds
}

impl<U, T> AuthMethodsService<U, T>
where
    U: UserDirectory + 'static,
    T: TokenManager + 'static,
{
    /// Create a new service with backup login disabled
    pub fn new(
        users: Arc<U>,
        tokens: Arc<T>,
        state_cache: Arc<dyn StateCache>,
        providers: ProviderRegistry,
        redirects: RedirectPolicy,
    ) -> Self {
        Self {
            users,
            tokens,
            state_cache,
            providers,
            redirects,
            backup_users: None,
            security_events: Arc::new(TracingSecurityEventSink),
            state_ttl: DEFAULT_STATE_TTL,
        }
    }

    /// Enable backup login for the given accounts
    pub fn with_backup_users(mut self, backup_users: Option<BackupUsers>) -> Self {
        self.backup_users = backup_users;
        self
    }

    pub fn with_security_events(mut self, sink: Arc<dyn SecurityEventSink>) -> Self {
        self.security_events = sink;
        self
    }

    /// OAuth flow state lifetime in seconds
    pub fn with_state_ttl(mut self, state_ttl: u64) -> Self {
        self.state_ttl = state_ttl;
        self
    }
}

#[async_trait]
impl<U, T> AuthMethods for AuthMethodsService<U, T>
where
    U: UserDirectory + 'static,
    T: TokenManager + 'static,
{
    async fn initiate_login(
        &self,
        provider: &str,
        client_redirect: Option<&str>,
    ) -> Result<LoginInitiation> {
        self.initiate_login_internal(provider, client_redirect).await
    }

    async fn handle_callback(&self, provider: &str, params: CallbackParams) -> CallbackOutcome {
        self.handle_callback_internal(provider, params).await
    }

    async fn authenticate_backup(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        self.authenticate_backup_internal(username, password).await
    }

    fn backup_login_enabled(&self) -> bool {
        self.backup_users.is_some()
    }

    fn providers(&self) -> Vec<String> {
        self.providers
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

//! Login method trait definitions.

use crate::{errors::Result, types::*};
use async_trait::async_trait;

/// OAuth flow controller and backup login
#[async_trait]
pub trait AuthMethods: Send + Sync {
    /// Start an OAuth login: store flow state and build the provider URL.
    ///
    /// Fails with `InvalidProvider` for an unconfigured provider and with
    /// `RedirectNotAllowed` for a client redirect outside the allow-list.
    async fn initiate_login(
        &self,
        provider: &str,
        client_redirect: Option<&str>,
    ) -> Result<LoginInitiation>;

    /// Complete an OAuth login. Every path, including failures, resolves to
    /// a redirect.
    async fn handle_callback(&self, provider: &str, params: CallbackParams) -> CallbackOutcome;

    /// Authenticate against a configured backup account.
    ///
    /// Any mismatch is `Unauthorized`; `BackupLoginDisabled` when no account
    /// is configured.
    async fn authenticate_backup(&self, username: &str, password: &str) -> Result<LoginOutcome>;

    /// Whether at least one backup account is configured
    fn backup_login_enabled(&self) -> bool;

    /// Names of the configured providers
    fn providers(&self) -> Vec<String>;
}

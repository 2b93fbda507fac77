//! OAuth authorization-code flow.

use crate::{
    errors::*,
    events::SecurityEvent,
    oauth::{OAuthFlowState, StateToken},
    redirect::{append_query, error_redirect},
    types::*,
};
use gatehouse_crypto::{current_timestamp, generate_token, hash_for_log};
use gatehouse_identity::UserDirectory;
use gatehouse_tokens::TokenManager;
use tracing::{info, warn};
use url::Url;

use super::AuthMethodsService;

impl<U, T> AuthMethodsService<U, T>
where
    U: UserDirectory + 'static,
    T: TokenManager + 'static,
{
    pub(super) async fn initiate_login_internal(
        &self,
        provider: &str,
        client_redirect: Option<&str>,
    ) -> Result<LoginInitiation> {
        let adapter = self.providers.get(provider)?;
        let client_redirect = self.redirects.resolve(client_redirect)?;

        let nonce = generate_token::<32>();
        let now = current_timestamp();
        let token = StateToken::new(
            nonce.clone(),
            provider.to_string(),
            client_redirect.to_string(),
            adapter.redirect_uri().to_string(),
        );
        let state = token.encode()?;

        self.state_cache
            .put(OAuthFlowState {
                nonce,
                provider: token.provider,
                client_redirect: token.client_redirect,
                provider_redirect: token.provider_redirect,
                created_at: now,
                expires_at: now + self.state_ttl,
            })
            .await?;

        let auth_url = adapter.authorization_url(&state)?;

        info!(
            provider = %provider,
            state_hash = %hash_for_log(&state),
            "OAuth flow initiated"
        );

        Ok(LoginInitiation { auth_url, state })
    }

    pub(super) async fn handle_callback_internal(
        &self,
        provider: &str,
        params: CallbackParams,
    ) -> CallbackOutcome {
        match self.complete_login(provider, &params).await {
            Ok((target, login)) => {
                let expires_in = login.tokens.expires_in.to_string();
                let redirect_url = append_query(
                    &target,
                    &[
                        ("access_token", login.tokens.access_token.as_str()),
                        ("refresh_token", login.tokens.refresh_token.as_str()),
                        ("token_type", login.tokens.token_type.as_str()),
                        ("expires_in", expires_in.as_str()),
                    ],
                );

                info!(
                    provider = %provider,
                    user_id = %login.user.user_id,
                    "OAuth login completed"
                );

                CallbackOutcome::Success {
                    redirect_url,
                    login,
                }
            }
            Err(error) => {
                // The embedded target is only honoured if it is still allowed
                let embedded = params
                    .state
                    .as_deref()
                    .and_then(|state| StateToken::decode(state).ok())
                    .map(|token| token.client_redirect);
                let target = self.redirects.resolve_or_default(embedded.as_deref());

                warn!(provider = %provider, error = %error, "OAuth callback failed");
                self.security_events
                    .record(SecurityEvent::OAuthCallbackFailed {
                        provider: provider.to_string(),
                        reason: error.to_string(),
                    })
                    .await;

                CallbackOutcome::Failure {
                    redirect_url: error_redirect(&target),
                    error,
                }
            }
        }
    }

    async fn complete_login(
        &self,
        provider: &str,
        params: &CallbackParams,
    ) -> Result<(Url, LoginOutcome)> {
        let adapter = self.providers.get(provider)?;

        let state = params
            .state
            .as_deref()
            .ok_or(AuthMethodsError::InvalidOrExpiredState)?;
        let flow = self.consume_state(provider, state).await?;

        if let Some(provider_error) = &params.error {
            return Err(AuthMethodsError::ProviderExchangeFailed(format!(
                "Provider returned error: {}",
                provider_error
            )));
        }

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                AuthMethodsError::ProviderExchangeFailed("Callback carried no code".to_string())
            })?;

        let target = self.redirects.resolve(Some(&flow.client_redirect))?;

        let provider_token = adapter.exchange_code(code).await?;
        let profile = adapter.fetch_identity(&provider_token).await?;
        drop(provider_token);

        let user = self.users.upsert_oauth_user(profile).await?;
        let tokens = self.tokens.issue_token_pair(&user).await?;

        Ok((target, LoginOutcome { user, tokens }))
    }

    /// Decode the state token and claim its flow state. Only the first
    /// caller for a nonce gets past this point.
    async fn consume_state(&self, provider: &str, state: &str) -> Result<OAuthFlowState> {
        let token = StateToken::decode(state).map_err(|e| {
            warn!(
                provider = %provider,
                state_hash = %hash_for_log(state),
                "Malformed OAuth state"
            );
            e
        })?;

        let flow = self.state_cache.take(&token.nonce).await?.ok_or_else(|| {
            warn!(
                provider = %provider,
                state_hash = %hash_for_log(state),
                "OAuth state unknown, expired or already used"
            );
            AuthMethodsError::InvalidOrExpiredState
        })?;

        if flow.provider != provider || !flow.matches(&token) {
            warn!(
                provider = %provider,
                state_hash = %hash_for_log(state),
                "OAuth state does not match the callback"
            );
            return Err(AuthMethodsError::InvalidOrExpiredState);
        }

        Ok(flow)
    }
}

//! Google OAuth provider implementation.

use crate::errors::*;
use crate::oauth::{client::OAuthClient, config::OAuthConfig, providers::Provider};
use async_trait::async_trait;
use gatehouse_identity::ProviderProfile;
use serde::Deserialize;

pub const GOOGLE_PROVIDER: &str = "google";

#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, alias = "email_verified")]
    verified_email: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Google OAuth provider
pub struct GoogleProvider {
    config: OAuthConfig,
    client: OAuthClient,
}

impl GoogleProvider {
    pub fn new(config: OAuthConfig, client: OAuthClient) -> Self {
        Self { config, client }
    }
}

/// Username for a Google account: the e-mail local part, else the account id
fn derive_username(id: &str, email: Option<&str>) -> String {
    email
        .and_then(|e| e.split('@').next())
        .filter(|local| !local.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("google_{}", id))
}

#[async_trait]
impl Provider for GoogleProvider {
    fn name(&self) -> &str {
        GOOGLE_PROVIDER
    }

    fn redirect_uri(&self) -> &str {
        &self.config.redirect_uri
    }

    fn authorization_url(&self, state: &str) -> Result<String> {
        self.client.build_auth_url(&self.config, state)
    }

    async fn exchange_code(&self, code: &str) -> Result<String> {
        self.client
            .exchange_code(&self.config, code)
            .await?
            .into_access_token()
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<ProviderProfile> {
        let user: GoogleUser = self
            .client
            .get_json(&self.config.user_info_url, access_token)
            .await?;

        // Unverified addresses are never trusted for account matching
        let email = user.email.filter(|_| user.verified_email);
        let username = derive_username(&user.id, email.as_deref());

        Ok(ProviderProfile {
            provider: GOOGLE_PROVIDER.to_string(),
            external_id: user.id,
            email,
            username,
            display_name: user.name,
            avatar_url: user.picture,
        })
    }
}

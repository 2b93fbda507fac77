//! Generic OAuth client for provider interactions.

use crate::errors::*;
use crate::oauth::config::OAuthConfig;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("gatehouse/", env!("CARGO_PKG_VERSION"));

/// Token endpoint response.
///
/// Some providers answer a rejected code with `200 OK` and an `error` field,
/// so every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthTokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl OAuthTokenResponse {
    /// The provider access token, or the provider-reported reason it is missing
    pub fn into_access_token(self) -> Result<String> {
        match self.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AuthMethodsError::ProviderExchangeFailed(
                self.error
                    .unwrap_or_else(|| "token response carried no access_token".to_string()),
            )),
        }
    }
}

/// OAuth client for provider interactions
///
/// Every request carries the configured timeout. Nothing is retried: an
/// authorization code is single-use at the provider.
#[derive(Clone)]
pub struct OAuthClient {
    http_client: Client,
}

impl OAuthClient {
    /// Create a new OAuth client with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                AuthMethodsError::OAuthConfigInvalid(format!("HTTP client setup failed: {}", e))
            })?;

        Ok(Self { http_client })
    }

    /// Build authorization URL
    pub fn build_auth_url(&self, config: &OAuthConfig, state: &str) -> Result<String> {
        let mut url = Url::parse(&config.auth_url).map_err(|e| {
            AuthMethodsError::OAuthConfigInvalid(format!("Invalid auth URL: {}", e))
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", &config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &config.scopes.join(" "))
            .append_pair("state", state);

        Ok(url.to_string())
    }

    /// Exchange authorization code for access token
    pub async fn exchange_code(
        &self,
        config: &OAuthConfig,
        code: &str,
    ) -> Result<OAuthTokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
        ];

        let response = self
            .http_client
            .post(&config.token_url)
            .header(header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                AuthMethodsError::ProviderExchangeFailed(format!("Token exchange failed: {}", e))
            })?;

        let status = response.status();
        let token_response: OAuthTokenResponse = response.json().await.map_err(|e| {
            AuthMethodsError::ProviderExchangeFailed(format!(
                "Failed to parse token response (status {}): {}",
                status, e
            ))
        })?;

        if !status.is_success() {
            return Err(AuthMethodsError::ProviderExchangeFailed(format!(
                "Token exchange failed with status {}: {}",
                status,
                token_response.error.as_deref().unwrap_or("unknown error")
            )));
        }

        Ok(token_response)
    }

    /// GET a JSON resource with the provider access token
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, access_token: &str) -> Result<T> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                AuthMethodsError::ProviderExchangeFailed(format!("User info request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AuthMethodsError::ProviderExchangeFailed(format!(
                "User info request failed with status {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            AuthMethodsError::ProviderExchangeFailed(format!("Failed to parse user info: {}", e))
        })
    }
}

//! GitHub OAuth provider implementation.

use crate::errors::*;
use crate::oauth::{client::OAuthClient, config::OAuthConfig, providers::Provider};
use async_trait::async_trait;
use gatehouse_identity::ProviderProfile;
use serde::Deserialize;

pub const GITHUB_PROVIDER: &str = "github";

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    verified: bool,
}

/// GitHub OAuth provider
///
/// Users without a public e-mail get their primary verified address from
/// `{user_info_url}/emails`.
pub struct GitHubProvider {
    config: OAuthConfig,
    client: OAuthClient,
}

impl GitHubProvider {
    pub fn new(config: OAuthConfig, client: OAuthClient) -> Self {
        Self { config, client }
    }

    async fn primary_email(&self, access_token: &str) -> Result<Option<String>> {
        let url = format!("{}/emails", self.config.user_info_url.trim_end_matches('/'));
        let emails: Vec<GitHubEmail> = self.client.get_json(&url, access_token).await?;

        Ok(emails
            .into_iter()
            .find(|e| e.primary && e.verified)
            .map(|e| e.email))
    }
}

#[async_trait]
impl Provider for GitHubProvider {
    fn name(&self) -> &str {
        GITHUB_PROVIDER
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
        let user: GitHubUser = self
            .client
            .get_json(&self.config.user_info_url, access_token)
            .await?;

        let email = match user.email.filter(|e| !e.is_empty()) {
            Some(email) => Some(email),
            None => self.primary_email(access_token).await?,
        };

        Ok(ProviderProfile {
            provider: GITHUB_PROVIDER.to_string(),
            external_id: user.id.to_string(),
            email,
            username: user.login,
            display_name: user.name,
            avatar_url: user.avatar_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> GitHubProvider {
        let config = OAuthConfig::github(
            "gh-client".to_string(),
            "gh-secret".to_string(),
            "http://localhost:8008/callback/github".to_string(),
        )
        .with_endpoints(
            format!("{}/login/oauth/access_token", server.uri()),
            format!("{}/user", server.uri()),
        );

        GitHubProvider::new(config, OAuthClient::new(Duration::from_secs(2)).unwrap())
    }

    #[test]
    fn test_authorization_url() {
        let config = OAuthConfig::github(
            "gh-client".to_string(),
            "gh-secret".to_string(),
            "http://localhost:8008/callback/github".to_string(),
        );
        let provider =
            GitHubProvider::new(config, OAuthClient::new(Duration::from_secs(2)).unwrap());

        let url = provider.authorization_url("opaque-state").unwrap();

        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=gh-client"));
        assert!(url.contains("scope=user%3Aemail"));
        assert!(url.contains("state=opaque-state"));
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .and(header("accept", "application/json"))
            .and(body_string_contains("code=abc"))
            .and(body_string_contains("client_secret=gh-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "gho_provider_token",
                "token_type": "bearer",
                "scope": "user:email"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = provider_for(&server).exchange_code("abc").await.unwrap();
        assert_eq!(token, "gho_provider_token");
    }

    #[tokio::test]
    async fn test_exchange_code_rejected_with_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "bad_verification_code",
                "error_description": "The code passed is incorrect or expired."
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).exchange_code("stale").await.unwrap_err();
        assert!(matches!(err, AuthMethodsError::ProviderExchangeFailed(_)));
    }

    #[tokio::test]
    async fn test_exchange_code_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "late" }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server).exchange_code("abc").await.unwrap_err();
        assert!(matches!(err, AuthMethodsError::ProviderExchangeFailed(_)));
    }

    #[tokio::test]
    async fn test_fetch_identity_with_public_email() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("authorization", "Bearer gho_provider_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 42,
                "login": "octocat",
                "name": "The Octocat",
                "email": "octocat@github.com",
                "avatar_url": "https://avatars.githubusercontent.com/u/42"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/emails"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let profile = provider_for(&server)
            .fetch_identity("gho_provider_token")
            .await
            .unwrap();

        assert_eq!(profile.provider, "github");
        assert_eq!(profile.external_id, "42");
        assert_eq!(profile.username, "octocat");
        assert_eq!(profile.email.as_deref(), Some("octocat@github.com"));
        assert_eq!(profile.display_name.as_deref(), Some("The Octocat"));
    }

    #[tokio::test]
    async fn test_fetch_identity_falls_back_to_primary_email() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "login": "private-person",
                "name": null,
                "email": null
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/emails"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "email": "old@example.com", "primary": false, "verified": true },
                { "email": "main@example.com", "primary": true, "verified": true }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let profile = provider_for(&server).fetch_identity("token").await.unwrap();

        assert_eq!(profile.external_id, "7");
        assert_eq!(profile.email.as_deref(), Some("main@example.com"));
        assert!(profile.display_name.is_none());
    }

    #[tokio::test]
    async fn test_fetch_identity_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = provider_for(&server).fetch_identity("revoked").await.unwrap_err();
        assert!(matches!(err, AuthMethodsError::ProviderExchangeFailed(_)));
    }
}

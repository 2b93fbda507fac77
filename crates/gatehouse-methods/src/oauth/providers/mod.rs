//! OAuth provider adapters.

pub mod github;
pub mod google;

pub use github::GitHubProvider;
pub use google::GoogleProvider;

use crate::errors::*;
use async_trait::async_trait;
use gatehouse_identity::ProviderProfile;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Uniform interface to an external identity provider.
///
/// Adding a provider means adding an implementation and registering it;
/// the flow controller never branches on provider names.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name as used in routes and on user records ("github")
    fn name(&self) -> &str;

    /// Callback URL registered with the provider
    fn redirect_uri(&self) -> &str;

    /// Authorization URL embedding the opaque state token
    fn authorization_url(&self, state: &str) -> Result<String>;

    /// Exchange an authorization code for a provider access token
    async fn exchange_code(&self, code: &str) -> Result<String>;

    /// Fetch the user's profile with a provider access token
    async fn fetch_identity(&self, access_token: &str) -> Result<ProviderProfile>;
}

/// Configured providers, keyed by name
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own name, replacing any previous one
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Look up a provider, failing with `InvalidProvider` if unknown
    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| AuthMethodsError::InvalidProvider(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Names of every configured provider, sorted
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

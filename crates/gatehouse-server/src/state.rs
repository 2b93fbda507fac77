use anyhow::{Context, Result};
use gatehouse_identity::UserService;
use gatehouse_methods::{
    oauth::config::callback_url, AuthMethods, AuthMethodsService, GitHubProvider, GoogleProvider,
    MokaStateCache, OAuthClient, OAuthConfig, ProviderRegistry, RedirectPolicy, StateCache,
    StorageStateCache, TracingSecurityEventSink,
};
use gatehouse_storage::RocksDbStorage;
use gatehouse_tokens::TokenService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{Config, StateCacheBackend};

pub type Users = UserService<RocksDbStorage>;
pub type Tokens = TokenService<RocksDbStorage, Users, TracingSecurityEventSink>;
pub type Methods = AuthMethodsService<Users, Tokens>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<Users>,
    pub tokens: Arc<Tokens>,
    pub auth_methods: Arc<Methods>,
    /// Set when flow state lives in the store and needs periodic purging
    pub stored_states: Option<Arc<StorageStateCache<RocksDbStorage>>>,
}

impl AppState {
    /// Open the configured database and wire every service
    pub async fn new(config: Config) -> Result<Self> {
        let storage = Arc::new(
            RocksDbStorage::open(&config.database_path)
                .with_context(|| format!("opening database at {}", config.database_path.display()))?,
        );
        let providers = build_providers(&config)?;

        Self::with_storage(config, storage, providers)
    }

    /// Wire services over an already-open store and provider set
    pub fn with_storage(
        config: Config,
        storage: Arc<RocksDbStorage>,
        providers: ProviderRegistry,
    ) -> Result<Self> {
        let users = Arc::new(UserService::new(Arc::clone(&storage)));

        let tokens = Arc::new(
            TokenService::with_event_publisher(
                Arc::clone(&storage),
                Arc::clone(&users),
                Arc::new(TracingSecurityEventSink),
                config.token.clone(),
            )
            .context("invalid token configuration")?,
        );

        let stored_states = match config.state_cache_backend {
            StateCacheBackend::Memory => None,
            StateCacheBackend::Storage => Some(Arc::new(StorageStateCache::new(Arc::clone(&storage)))),
        };
        let state_cache: Arc<dyn StateCache> = match &stored_states {
            Some(cache) => cache.clone(),
            None => Arc::new(MokaStateCache::new(Duration::from_secs(config.oauth_state_ttl))),
        };

        let redirects =
            RedirectPolicy::new(&config.frontend_url, &config.allowed_redirect_origins)
                .context("invalid redirect configuration")?;

        let auth_methods = Arc::new(
            AuthMethodsService::new(
                Arc::clone(&users),
                Arc::clone(&tokens),
                state_cache,
                providers,
                redirects,
            )
            .with_state_ttl(config.oauth_state_ttl)
            .with_backup_users(config.backup_users.clone()),
        );

        let configured = auth_methods.providers();
        if configured.is_empty() {
            warn!("No OAuth providers configured");
        } else {
            info!(providers = ?configured, "OAuth providers configured");
        }

        if auth_methods.backup_login_enabled() {
            info!("Backup login enabled");
        } else {
            warn!("Backup login disabled: no backup account with a strong Argon2 hash configured");
        }

        Ok(AppState {
            config,
            users,
            tokens,
            auth_methods,
            stored_states,
        })
    }

    /// Start purging expired flow states once per state TTL.
    ///
    /// Returns `None` with the in-memory backend, which expires entries itself.
    pub fn spawn_state_sweep(&self) -> Option<JoinHandle<()>> {
        let states = Arc::clone(self.stored_states.as_ref()?);
        let period = Duration::from_secs(self.config.oauth_state_ttl);

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                match states.purge_expired().await {
                    Ok(purged) => debug!(purged, "OAuth state sweep finished"),
                    Err(e) => warn!(error = %e, "OAuth state sweep failed"),
                }
            }
        }))
    }
}

/// Provider adapters for every provider with both client id and secret set
pub fn build_providers(config: &Config) -> Result<ProviderRegistry> {
    let client = OAuthClient::new(config.provider_timeout)?;
    let mut providers = ProviderRegistry::new();

    if let Some(github) = &config.github {
        let oauth_config = OAuthConfig::github(
            github.client_id.clone(),
            github.client_secret.clone(),
            callback_url(&config.public_base_url, "github"),
        );
        providers.register(Arc::new(GitHubProvider::new(oauth_config, client.clone())));
    }

    if let Some(google) = &config.google {
        let oauth_config = OAuthConfig::google(
            google.client_id.clone(),
            google.client_secret.clone(),
            callback_url(&config.public_base_url, "google"),
        );
        providers.register(Arc::new(GoogleProvider::new(oauth_config, client)));
    }

    Ok(providers)
}

use anyhow::{bail, Context, Result};
use gatehouse_methods::BackupUsers;
use gatehouse_tokens::{HmacAlgorithm, SigningKeyConfig, TokenConfig};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use zeroize::Zeroizing;

/// Secrets shipped in sample configuration files; never valid signing keys
const PLACEHOLDER_SECRETS: [&str; 5] = [
    "your-super-secret-jwt-key-change-this",
    "your-secret-key",
    "changeme",
    "change-me",
    "secret",
];

/// Where OAuth flow state lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCacheBackend {
    /// In-process moka cache
    Memory,
    /// RocksDB column family shared with the credential store
    Storage,
}

/// Client credentials registered with an OAuth provider
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Path to RocksDB database
    pub database_path: PathBuf,

    /// Base URL provider callbacks are built from
    pub public_base_url: String,

    /// Default client redirect target
    pub frontend_url: String,

    /// Extra origins client redirect targets may point at
    pub allowed_redirect_origins: Vec<String>,

    pub cors_allowed_origins: Vec<String>,

    pub state_cache_backend: StateCacheBackend,

    /// OAuth flow state lifetime (seconds)
    pub oauth_state_ttl: u64,

    /// Timeout for every outbound provider request
    pub provider_timeout: Duration,

    /// Signing key, issuer, audience and lifetimes
    pub token: TokenConfig,

    pub github: Option<OAuthCredentials>,

    pub google: Option<OAuthCredentials>,

    /// `None` disables backup login
    pub backup_users: Option<BackupUsers>,
}

impl Config {
    /// Load configuration from environment variables, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_address = var("BIND_ADDRESS")
            .unwrap_or_else(|| "127.0.0.1:8008".to_string())
            .parse()
            .context("BIND_ADDRESS must be a socket address")?;

        let database_path = var("DATABASE_PATH")
            .unwrap_or_else(|| "./data/gatehouse.db".to_string())
            .into();

        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8008".to_string());
        Url::parse(&public_base_url).context("PUBLIC_BASE_URL must be an absolute URL")?;
        let public_base_url = public_base_url.trim_end_matches('/').to_string();

        let frontend_url =
            var("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_string());
        Url::parse(&frontend_url).context("FRONTEND_URL must be an absolute URL")?;

        let allowed_redirect_origins = var("ALLOWED_REDIRECT_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|| vec![origin_of(&frontend_url)]);

        let state_cache_backend = match var("STATE_CACHE_BACKEND").as_deref() {
            None | Some("memory") => StateCacheBackend::Memory,
            Some("storage") => StateCacheBackend::Storage,
            Some(other) => bail!("STATE_CACHE_BACKEND must be 'memory' or 'storage', got '{}'", other),
        };

        let oauth_state_ttl: u64 = parse_or(&var, "OAUTH_STATE_TTL_SECONDS", 600)?;
        if oauth_state_ttl == 0 {
            bail!("OAUTH_STATE_TTL_SECONDS must be positive");
        }

        let provider_timeout = Duration::from_secs(parse_or(&var, "PROVIDER_TIMEOUT_SECONDS", 5)?);

        let token = Self::token_config(&var)?;

        let github = Self::oauth_credentials(&var, "GITHUB");
        let google = Self::oauth_credentials(&var, "GOOGLE");

        let backup_users = match var("BACKUP_USERS") {
            Some(json) => {
                BackupUsers::from_json(&json).context("BACKUP_USERS must be a JSON object")?
            }
            None => None,
        };

        Ok(Config {
            bind_address,
            database_path,
            public_base_url,
            frontend_url,
            allowed_redirect_origins,
            cors_allowed_origins,
            state_cache_backend,
            oauth_state_ttl,
            provider_timeout,
            token,
            github,
            google,
            backup_users,
        })
    }

    fn token_config<F>(var: &F) -> Result<TokenConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let algorithm = var("JWT_ALGORITHM").unwrap_or_else(|| "HS256".to_string());

        let hmac = |algorithm: HmacAlgorithm| -> Result<SigningKeyConfig> {
            let secret = var("JWT_SECRET_KEY")
                .context("JWT_SECRET_KEY is required for HMAC signing")?;
            if PLACEHOLDER_SECRETS
                .iter()
                .any(|p| secret.eq_ignore_ascii_case(p))
            {
                bail!("JWT_SECRET_KEY is a placeholder value; generate a real secret");
            }
            Ok(SigningKeyConfig::Hmac {
                algorithm,
                secret: Zeroizing::new(secret.into_bytes()),
            })
        };

        let signing_key = match algorithm.as_str() {
            "HS256" => hmac(HmacAlgorithm::HS256)?,
            "HS384" => hmac(HmacAlgorithm::HS384)?,
            "HS512" => hmac(HmacAlgorithm::HS512)?,
            "EdDSA" => {
                let seed_hex = var("JWT_SIGNING_SEED")
                    .context("JWT_SIGNING_SEED is required for EdDSA signing")?;
                let bytes = Zeroizing::new(
                    hex::decode(seed_hex.trim()).context("JWT_SIGNING_SEED must be hex")?,
                );
                if bytes.len() != 32 {
                    bail!("JWT_SIGNING_SEED must be 32 bytes (64 hex chars)");
                }
                let mut seed = Zeroizing::new([0u8; 32]);
                seed.copy_from_slice(&bytes);
                SigningKeyConfig::EdDSA { seed }
            }
            other => bail!("Unsupported JWT_ALGORITHM '{}'", other),
        };

        let mut token = TokenConfig::new(signing_key);
        if let Some(issuer) = var("JWT_ISSUER") {
            token.issuer = issuer;
        }
        if let Some(audience) = var("JWT_AUDIENCE") {
            token.audience = audience;
        }
        token.access_token_ttl = parse_or::<u64, _>(var, "ACCESS_TOKEN_EXPIRE_MINUTES", 30)? * 60;
        token.refresh_token_ttl =
            parse_or::<u64, _>(var, "REFRESH_TOKEN_EXPIRE_DAYS", 7)? * 24 * 60 * 60;

        Ok(token)
    }

    fn oauth_credentials<F>(var: &F, prefix: &str) -> Option<OAuthCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = var(&format!("{}_CLIENT_ID", prefix))?;
        let client_secret = var(&format!("{}_CLIENT_SECRET", prefix))?;
        Some(OAuthCredentials {
            client_id,
            client_secret,
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value", key)),
        None => Ok(default),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn origin_of(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.origin().ascii_serialization())
        .unwrap_or_else(|_| url.to_string())
}

//! Test helpers and stubs for login method tests.

use crate::*;
use async_trait::async_trait;
use gatehouse_crypto::hash_password;
use gatehouse_identity::{ProviderProfile, UserService};
use gatehouse_storage::RocksDbStorage;
use gatehouse_tokens::{HmacAlgorithm, NoOpEventPublisher, SigningKeyConfig, TokenConfig, TokenService};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zeroize::Zeroizing;

pub const TEST_SECRET: &[u8] = b"unit-test-signing-secret-0123456789abcdef";
pub const FRONTEND_URL: &str = "http://localhost:3000/auth/done";
pub const ADMIN_ORIGIN: &str = "https://admin.example.com";
pub const GOOD_CODE: &str = "abc";

pub type TestUserService = UserService<RocksDbStorage>;
pub type TestTokenService = TokenService<RocksDbStorage, TestUserService, NoOpEventPublisher>;
pub type TestAuthMethods = AuthMethodsService<TestUserService, TestTokenService>;

/// Provider that accepts one code and returns a fixed profile
pub struct StubProvider {
    name: String,
    profile: ProviderProfile,
    exchanges: AtomicUsize,
}

impl StubProvider {
    pub fn new(name: &str, external_id: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            profile: ProviderProfile {
                provider: name.to_string(),
                external_id: external_id.to_string(),
                email: Some(email.to_string()),
                username: format!("{}_user", name),
                display_name: Some("Stub User".to_string()),
                avatar_url: None,
            },
            exchanges: AtomicUsize::new(0),
        }
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn redirect_uri(&self) -> &str {
        "http://localhost:8008/callback/stub"
    }

    fn authorization_url(&self, state: &str) -> Result<String> {
        Ok(format!("https://provider.example/authorize?state={}", state))
    }

    async fn exchange_code(&self, code: &str) -> Result<String> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if code == GOOD_CODE {
            Ok("provider-access-token".to_string())
        } else {
            Err(AuthMethodsError::ProviderExchangeFailed(
                "invalid_grant".to_string(),
            ))
        }
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<ProviderProfile> {
        assert_eq!(access_token, "provider-access-token");
        Ok(self.profile.clone())
    }
}

/// Security event sink that keeps every event for inspection
#[derive(Default)]
pub struct RecordingSecurityEvents {
    events: Mutex<Vec<SecurityEvent>>,
}

impl RecordingSecurityEvents {
    pub fn events(&self) -> Vec<SecurityEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecurityEventSink for RecordingSecurityEvents {
    async fn record(&self, event: SecurityEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct TestContext {
    pub users: Arc<TestUserService>,
    pub tokens: Arc<TestTokenService>,
    pub github: Arc<StubProvider>,
    pub events: Arc<RecordingSecurityEvents>,
    pub service: Arc<TestAuthMethods>,
}

pub struct TestOptions {
    pub state_ttl: u64,
    pub backup_users: Option<BackupUsers>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            state_ttl: DEFAULT_STATE_TTL,
            backup_users: None,
        }
    }
}

/// Helper to create a service with a stub "github" and "gitlab" provider
pub fn create_test_context(options: TestOptions) -> TestContext {
    let storage = Arc::new(RocksDbStorage::open_test().unwrap());
    let users = Arc::new(UserService::new(Arc::clone(&storage)));
    let tokens = Arc::new(
        TokenService::new(
            Arc::clone(&storage),
            Arc::clone(&users),
            TokenConfig::new(SigningKeyConfig::Hmac {
                algorithm: HmacAlgorithm::HS256,
                secret: Zeroizing::new(TEST_SECRET.to_vec()),
            }),
        )
        .unwrap(),
    );

    let github = Arc::new(StubProvider::new("github", "42", "a@b.com"));
    let mut providers = ProviderRegistry::new();
    providers.register(github.clone());
    providers.register(Arc::new(StubProvider::new("gitlab", "42", "a@b.com")));

    let redirects = RedirectPolicy::new(FRONTEND_URL, &[ADMIN_ORIGIN.to_string()]).unwrap();
    let events = Arc::new(RecordingSecurityEvents::default());

    let service = AuthMethodsService::new(
        Arc::clone(&users),
        Arc::clone(&tokens),
        Arc::new(MokaStateCache::new(Duration::from_secs(600))),
        providers,
        redirects,
    )
    .with_state_ttl(options.state_ttl)
    .with_backup_users(options.backup_users)
    .with_security_events(events.clone());

    TestContext {
        users,
        tokens,
        github,
        events,
        service: Arc::new(service),
    }
}

/// Backup accounts: "admin" (password "admin123", full access) and
/// "ops" (password "ops-pass", matched to `ops_email` if given)
pub fn backup_users(ops_email: Option<&str>) -> BackupUsers {
    let mut full_access = BTreeMap::new();
    full_access.insert("*".to_string(), vec!["*".to_string()]);

    let mut entries = BTreeMap::new();
    entries.insert(
        "admin".to_string(),
        BackupUserEntry {
            password_hash: hash_password(b"admin123").unwrap(),
            is_admin: true,
            permissions: full_access,
            email: None,
        },
    );
    entries.insert(
        "ops".to_string(),
        BackupUserEntry {
            password_hash: hash_password(b"ops-pass").unwrap(),
            is_admin: false,
            permissions: BTreeMap::new(),
            email: ops_email.map(str::to_string),
        },
    );

    BackupUsers::from_entries(entries).unwrap().unwrap()
}

pub fn callback(code: &str, state: &str) -> CallbackParams {
    CallbackParams {
        code: Some(code.to_string()),
        state: Some(state.to_string()),
        error: None,
    }
}

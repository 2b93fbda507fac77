//! Test helpers and mocks for token service tests.

use crate::*;
use async_trait::async_trait;
use gatehouse_identity::{Permissions, ProviderProfile, User, UserDirectory, UserService};
use gatehouse_storage::RocksDbStorage;
use std::sync::{Arc, Mutex};
use zeroize::Zeroizing;

pub const TEST_SECRET: &[u8] = b"unit-test-signing-secret-0123456789abcdef";

pub type TestUserService = UserService<RocksDbStorage>;
pub type TestTokenService =
    TokenService<RocksDbStorage, TestUserService, RecordingEventPublisher>;

/// Event publisher that keeps every event for inspection
#[derive(Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<RevocationEvent>>,
}

impl RecordingEventPublisher {
    pub fn event_types(&self) -> Vec<RevocationEventType> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type)
            .collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish_revocation_event(&self, event: RevocationEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

pub struct TestContext {
    pub storage: Arc<RocksDbStorage>,
    pub users: Arc<TestUserService>,
    pub tokens: Arc<TestTokenService>,
    pub events: Arc<RecordingEventPublisher>,
}

pub fn hmac_config() -> TokenConfig {
    TokenConfig::new(SigningKeyConfig::Hmac {
        algorithm: HmacAlgorithm::HS256,
        secret: Zeroizing::new(TEST_SECRET.to_vec()),
    })
}

pub fn eddsa_config() -> TokenConfig {
    TokenConfig::new(SigningKeyConfig::EdDSA {
        seed: Zeroizing::new([42u8; 32]),
    })
}

/// Helper to create a token service over fresh storage
pub fn create_test_context(config: TokenConfig) -> TestContext {
    let storage = Arc::new(RocksDbStorage::open_test().unwrap());
    let users = Arc::new(UserService::new(Arc::clone(&storage)));
    let events = Arc::new(RecordingEventPublisher::default());
    let tokens = Arc::new(
        TokenService::with_event_publisher(
            Arc::clone(&storage),
            Arc::clone(&users),
            Arc::clone(&events),
            config,
        )
        .unwrap(),
    );

    TestContext {
        storage,
        users,
        tokens,
        events,
    }
}

/// Helper to create a stored user with the given privileges
pub async fn create_test_user(
    users: &TestUserService,
    external_id: &str,
    is_admin: bool,
    permissions: Permissions,
) -> User {
    let user = users
        .upsert_oauth_user(ProviderProfile {
            provider: "github".to_string(),
            external_id: external_id.to_string(),
            email: Some(format!("{}@example.com", external_id)),
            username: format!("user{}", external_id),
            display_name: None,
            avatar_url: None,
        })
        .await
        .unwrap();

    users
        .set_permissions(user.user_id, is_admin, permissions)
        .await
        .unwrap()
}

pub fn billing_reader() -> Permissions {
    let mut perms = Permissions::new();
    perms.grant("billing", ["read"]);
    perms
}

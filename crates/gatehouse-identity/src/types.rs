//! User type definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub use gatehouse_crypto::current_timestamp;

/// Capability or service name granting full access
pub const WILDCARD: &str = "*";

/// Provider name under which backup-login users are recorded
pub const BACKUP_PROVIDER: &str = "backup";

/// Permission set: service name → capability list.
///
/// A `*` service entry applies to every service, and a `*` capability grants
/// every capability of its service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(BTreeMap<String, Vec<String>>);

impl Permissions {
    /// Empty permission set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add capabilities for a service, keeping existing ones
    pub fn grant<I, C>(&mut self, service: impl Into<String>, capabilities: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let entry = self.0.entry(service.into()).or_default();
        for capability in capabilities {
            let capability = capability.into();
            if !entry.contains(&capability) {
                entry.push(capability);
            }
        }
    }

    /// Whether `capability` on `service` is granted
    pub fn allows(&self, service: &str, capability: &str) -> bool {
        [service, WILDCARD].iter().any(|key| {
            self.0.get(*key).is_some_and(|caps| {
                caps.iter().any(|c| c == capability || c == WILDCARD)
            })
        })
    }

    /// Capabilities granted on a service, ignoring wildcards
    pub fn capabilities(&self, service: &str) -> &[String] {
        self.0.get(service).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.0
    }
}

impl From<BTreeMap<String, Vec<String>>> for Permissions {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

/// User record
///
/// `(provider, external_id)` is unique across all users. `is_admin` and
/// `permissions` only change through administrative calls or backup login
/// configuration, never through a provider profile refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub provider: String,
    pub external_id: String,
    pub email: Option<String>,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub permissions: Permissions,
    pub created_at: u64,
    pub updated_at: u64,
    pub last_login_at: Option<u64>,
}

/// Canonical identity returned by a provider after a successful exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub provider: String,
    pub external_id: String,
    pub email: Option<String>,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Backup-login account as configured by the operator (hash excluded)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupAccount {
    pub username: String,
    pub is_admin: bool,
    pub permissions: Permissions,
    pub email: Option<String>,
}

/// Key of the provider index: `"provider:external_id"`
pub fn provider_key(provider: &str, external_id: &str) -> String {
    format!("{}:{}", provider, external_id)
}

/// Key of the email index
pub fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

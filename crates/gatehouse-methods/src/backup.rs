//! Backup login accounts.
//!
//! Accounts come from operator configuration, not from the credential store.
//! Only Argon2 PHC hashes at or above the minimum cost parameters are
//! accepted; anything else is rejected at load time so the path can never
//! run against a weak or empty credential.

use crate::errors::*;
use gatehouse_crypto::{
    generate_random_bytes, hash_password_like, is_argon2_phc, is_strong_password_hash,
    password_hash_cost, MIN_ARGON2_ITERATIONS, MIN_ARGON2_MEMORY_KIB,
};
use gatehouse_identity::{BackupAccount, Permissions};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::warn;

/// One entry of the `BACKUP_USERS` JSON map
#[derive(Debug, Clone, Deserialize)]
pub struct BackupUserEntry {
    pub password_hash: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub permissions: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A configured account together with its password hash
#[derive(Clone)]
pub struct BackupCredential {
    pub account: BackupAccount,
    pub password_hash: String,
}

impl fmt::Debug for BackupCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupCredential")
            .field("account", &self.account)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Accepted backup accounts, keyed by username
#[derive(Debug, Clone)]
pub struct BackupUsers {
    credentials: HashMap<String, BackupCredential>,
    // Verified against for unknown usernames. Shares the parameters of the
    // costliest configured hash so both paths cost the same Argon2 run.
    dummy_hash: String,
}

impl BackupUsers {
    /// Build from parsed entries, dropping any without an Argon2 hash of at
    /// least the minimum cost.
    ///
    /// Returns `Ok(None)` when no entry survives: the backup path is disabled.
    pub fn from_entries(entries: BTreeMap<String, BackupUserEntry>) -> Result<Option<Self>> {
        let mut credentials = HashMap::new();

        for (username, entry) in entries {
            if username.trim().is_empty() {
                warn!("Ignoring backup user with empty username");
                continue;
            }

            if !is_argon2_phc(&entry.password_hash) {
                warn!(
                    username = %username,
                    "Ignoring backup user: password_hash is not an Argon2 PHC string"
                );
                continue;
            }

            if !is_strong_password_hash(&entry.password_hash) {
                warn!(
                    username = %username,
                    min_memory_kib = MIN_ARGON2_MEMORY_KIB,
                    min_iterations = MIN_ARGON2_ITERATIONS,
                    "Ignoring backup user: password_hash cost parameters are below the minimum"
                );
                continue;
            }

            let account = BackupAccount {
                username: username.clone(),
                is_admin: entry.is_admin,
                permissions: Permissions::from(entry.permissions),
                email: entry.email.filter(|e| !e.trim().is_empty()),
            };

            credentials.insert(
                username,
                BackupCredential {
                    account,
                    password_hash: entry.password_hash,
                },
            );
        }

        let Some(reference) = credentials
            .values()
            .max_by_key(|credential| password_hash_cost(&credential.password_hash))
        else {
            return Ok(None);
        };

        let dummy_hash =
            hash_password_like(&generate_random_bytes::<32>(), &reference.password_hash)?;

        Ok(Some(Self {
            credentials,
            dummy_hash,
        }))
    }

    /// Parse the `BACKUP_USERS` JSON map
    pub fn from_json(json: &str) -> Result<Option<Self>> {
        let entries: BTreeMap<String, BackupUserEntry> = serde_json::from_str(json)
            .map_err(|e| AuthMethodsError::BackupConfigInvalid(e.to_string()))?;

        Self::from_entries(entries)
    }

    pub fn get(&self, username: &str) -> Option<&BackupCredential> {
        self.credentials.get(username)
    }

    pub(crate) fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }

    /// Configured usernames, in no particular order
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.credentials.keys().map(String::as_str)
    }
}

//! # gatehouse-methods
//!
//! Login methods for the gatehouse credential service.
//!
//! This crate owns:
//! - The OAuth authorization-code flow (initiate and callback)
//! - Provider adapters for GitHub and Google
//! - Single-use, TTL-bound OAuth flow state
//! - Backup login against operator-configured Argon2 hashes
//! - Client redirect allow-listing

#![warn(clippy::all)]

pub mod backup;
pub mod errors;
pub mod events;
pub mod oauth;
pub mod redirect;
mod service;
pub mod state_cache;
pub mod traits;
pub mod types;


pub use backup::{BackupUserEntry, BackupUsers};
pub use errors::{AuthMethodsError, Result};
pub use events::{SecurityEvent, SecurityEventSink, TracingSecurityEventSink};
pub use oauth::{GitHubProvider, GoogleProvider, OAuthClient, OAuthConfig, Provider, ProviderRegistry};
pub use redirect::RedirectPolicy;
pub use service::{AuthMethodsService, DEFAULT_STATE_TTL};
pub use state_cache::{MokaStateCache, StateCache, StorageStateCache};
pub use traits::AuthMethods;
pub use types::*;

//! OAuth 2.0 authorization-code integration.
//!
//! This module provides:
//! - Generic OAuth 2.0 client with a bounded request timeout
//! - Provider adapters (GitHub, Google) behind the [`Provider`] trait
//! - The opaque state token and the flow state it points to
//!
//! # Security Note
//! Provider access tokens are NEVER stored. They are used to fetch the
//! user's profile during the callback and dropped immediately after.

pub mod client;
pub mod config;
pub mod providers;
pub mod state;

pub use client::{OAuthClient, OAuthTokenResponse};
pub use config::OAuthConfig;
pub use providers::{GitHubProvider, GoogleProvider, Provider, ProviderRegistry};
pub use state::{OAuthFlowState, StateToken};

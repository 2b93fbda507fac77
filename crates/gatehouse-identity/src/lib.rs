//! # gatehouse-identity
//!
//! User records for the gatehouse credential service.
//!
//! This crate owns:
//! - The `User` record and its `Permissions` set
//! - Upsert by (provider, external id) on every successful login
//! - Email lookup used by backup login matching
//! - Administrative permission changes

#![warn(clippy::all)]

pub mod errors;
pub mod service;
pub mod traits;
pub mod types;

pub use errors::{IdentityError, Result};
pub use service::UserService;
pub use traits::UserDirectory;
pub use types::*;

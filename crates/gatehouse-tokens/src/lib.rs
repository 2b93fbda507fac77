//! # gatehouse-tokens
//!
//! Token Service: issues, validates, rotates and revokes credentials.
//!
//! Access credentials are self-contained JWTs validated without any store
//! access. Refresh credentials are opaque random values; only their SHA-256
//! hash is persisted.

pub mod errors;
mod service;
pub mod traits;
pub mod types;


pub use errors::*;
pub use service::TokenService;
pub use traits::*;
pub use types::*;

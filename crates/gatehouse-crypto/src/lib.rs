//! # gatehouse-crypto
//!
//! Cryptographic primitives shared by the gatehouse crates.
//!
//! - SHA-256 for refresh-credential hashing
//! - BLAKE3 fingerprints for log-safe identifiers
//! - Argon2id password hashing, verification and cost checks
//! - URL-safe random secrets

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod errors;
pub mod hashing;
pub mod utils;

pub use encoding::*;
pub use errors::{CryptoError, Result};
pub use hashing::*;
pub use utils::current_timestamp;

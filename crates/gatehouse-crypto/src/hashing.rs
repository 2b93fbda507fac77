//! Hashing utilities using SHA-256, BLAKE3 and Argon2id.

use crate::{encoding::generate_random_bytes, errors::*};
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use sha2::{Digest, Sha256};

/// Argon2id memory cost in KiB
const ARGON2_MEMORY_KIB: u32 = 19 * 1024;

/// Argon2id iteration count
const ARGON2_ITERATIONS: u32 = 2;

/// Argon2id lanes
const ARGON2_PARALLELISM: u32 = 1;

/// Weakest Argon2 memory cost accepted for a configured hash, in KiB
pub const MIN_ARGON2_MEMORY_KIB: u32 = ARGON2_MEMORY_KIB;

/// Weakest Argon2 iteration count accepted for a configured hash
pub const MIN_ARGON2_ITERATIONS: u32 = ARGON2_ITERATIONS;

/// PHC identifiers accepted as strong password hashes
const ARGON2_PHC_PREFIXES: [&str; 3] = ["$argon2id$", "$argon2i$", "$argon2d$"];

/// SHA-256 hash
///
/// Used as the one-way hash for refresh credentials. Refresh values carry
/// 256 bits of entropy, so a fast hash is sufficient.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash data using BLAKE3
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    blake3::hash(data).into()
}

/// Short, log-safe fingerprint of a secret value.
///
/// Returns the first 8 bytes of the BLAKE3 hash as hex. Never log the raw
/// value of a state token, nonce or refresh credential.
pub fn hash_for_log(value: &str) -> String {
    let hash = blake3_hash(value.as_bytes());
    hex::encode(&hash[..8])
}

fn argon2id() -> Result<Argon2<'static>> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        None,
    )
    .map_err(|e| CryptoError::Argon2Failed(e.to_string()))?;

    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a password using Argon2id
///
/// # Returns
///
/// PHC-formatted hash string that includes algorithm, parameters, salt, and hash
pub fn hash_password(password: &[u8]) -> Result<String> {
    let salt = SaltString::encode_b64(&generate_random_bytes::<16>())
        .map_err(|e| CryptoError::Argon2Failed(e.to_string()))?;

    let password_hash = argon2id()?
        .hash_password(password, &salt)
        .map_err(|e| CryptoError::Argon2Failed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a password against an Argon2 PHC hash
///
/// The algorithm, version and cost parameters are read from the hash string
/// itself. The final tag comparison is constant time.
///
/// # Returns
///
/// `Ok(())` if password matches, `Err(CryptoError::PasswordMismatch)` otherwise
pub fn verify_password(password: &[u8], hash_str: &str) -> Result<()> {
    let parsed_hash = PasswordHash::new(hash_str).map_err(|_| CryptoError::InvalidHashFormat)?;

    Argon2::default()
        .verify_password(password, &parsed_hash)
        .map_err(|e| match e {
            argon2::password_hash::Error::Password => CryptoError::PasswordMismatch,
            other => CryptoError::Argon2Failed(other.to_string()),
        })
}

/// Whether `hash_str` is a well-formed Argon2 PHC string.
///
/// Anything else (plain digests, empty strings, placeholders) is not a
/// sufficiently strong password hash.
pub fn is_argon2_phc(hash_str: &str) -> bool {
    ARGON2_PHC_PREFIXES
        .iter()
        .any(|prefix| hash_str.starts_with(prefix))
        && PasswordHash::new(hash_str).is_ok()
}

/// Whether `hash_str` is an Argon2 PHC string whose cost parameters are at
/// least [`MIN_ARGON2_MEMORY_KIB`] and [`MIN_ARGON2_ITERATIONS`].
pub fn is_strong_password_hash(hash_str: &str) -> bool {
    if !is_argon2_phc(hash_str) {
        return false;
    }

    match argon2_for_hash(hash_str) {
        Ok(argon2) => {
            let params = argon2.params();
            params.m_cost() >= MIN_ARGON2_MEMORY_KIB && params.t_cost() >= MIN_ARGON2_ITERATIONS
        }
        Err(_) => false,
    }
}

/// Combined Argon2 cost of a PHC string (memory times iterations times
/// lanes), or `None` if it does not parse.
pub fn password_hash_cost(hash_str: &str) -> Option<u64> {
    let argon2 = argon2_for_hash(hash_str).ok()?;
    let params = argon2.params();
    Some(u64::from(params.m_cost()) * u64::from(params.t_cost()) * u64::from(params.p_cost()))
}

/// Hash a password with the algorithm, version and cost parameters read
/// from `reference`, so verifying against the result costs the same as
/// verifying against `reference`.
pub fn hash_password_like(password: &[u8], reference: &str) -> Result<String> {
    let salt = SaltString::encode_b64(&generate_random_bytes::<16>())
        .map_err(|e| CryptoError::Argon2Failed(e.to_string()))?;

    let password_hash = argon2_for_hash(reference)?
        .hash_password(password, &salt)
        .map_err(|e| CryptoError::Argon2Failed(e.to_string()))?;

    Ok(password_hash.to_string())
}

fn argon2_for_hash(hash_str: &str) -> Result<Argon2<'static>> {
    let parsed = PasswordHash::new(hash_str).map_err(|_| CryptoError::InvalidHashFormat)?;

    let algorithm =
        Algorithm::try_from(parsed.algorithm).map_err(|_| CryptoError::InvalidHashFormat)?;
    let version = match parsed.version {
        Some(version) => Version::try_from(version).map_err(|_| CryptoError::InvalidHashFormat)?,
        None => Version::default(),
    };
    let params = Params::try_from(&parsed).map_err(|_| CryptoError::InvalidHashFormat)?;

    Ok(Argon2::new(algorithm, version, params))
}

//! Random secret generation and URL-safe encoding helpers.

use crate::errors::{CryptoError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

/// Generate random bytes of the specified length
pub fn generate_random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generate a URL-safe random secret carrying `N` bytes of entropy
pub fn generate_token<const N: usize>() -> String {
    base64_url_encode(&generate_random_bytes::<N>())
}

/// URL-safe base64 encoding without padding
pub fn base64_url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// URL-safe base64 decoding without padding
pub fn base64_url_decode(data: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(data)
        .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))
}

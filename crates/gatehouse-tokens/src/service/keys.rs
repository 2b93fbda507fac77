//! JWT signing key material for the token service.

use crate::{errors::*, types::*};
use ed25519_dalek::SigningKey;
use gatehouse_crypto::{base64_url_encode, blake3_hash};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use zeroize::Zeroizing;

/// PKCS#8 v1 header for a raw Ed25519 seed
const ED25519_PKCS8_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];

/// Resolved signing and verification keys
pub(crate) struct SigningKeys {
    pub(crate) algorithm: Algorithm,
    pub(crate) encoding: EncodingKey,
    pub(crate) decoding: DecodingKey,
    pub(crate) kid: Option<String>,
    public_jwk: Option<JsonWebKey>,
}

impl SigningKeys {
    pub(crate) fn from_config(config: &SigningKeyConfig) -> Result<Self> {
        match config {
            SigningKeyConfig::Hmac { algorithm, secret } => {
                if secret.len() < MIN_HMAC_SECRET_LEN {
                    return Err(TokenError::InvalidConfig(format!(
                        "HMAC secret must be at least {} bytes",
                        MIN_HMAC_SECRET_LEN
                    )));
                }

                let algorithm = match algorithm {
                    HmacAlgorithm::HS256 => Algorithm::HS256,
                    HmacAlgorithm::HS384 => Algorithm::HS384,
                    HmacAlgorithm::HS512 => Algorithm::HS512,
                };

                Ok(Self {
                    algorithm,
                    encoding: EncodingKey::from_secret(secret),
                    decoding: DecodingKey::from_secret(secret),
                    kid: None,
                    public_jwk: None,
                })
            }
            SigningKeyConfig::EdDSA { seed } => {
                let signing_key = SigningKey::from_bytes(seed);
                let public_key = signing_key.verifying_key().to_bytes();

                let mut pkcs8_der = Zeroizing::new(Vec::with_capacity(48));
                pkcs8_der.extend_from_slice(&ED25519_PKCS8_PREFIX);
                pkcs8_der.extend_from_slice(&seed[..]);
                let encoding = EncodingKey::from_ed_der(&pkcs8_der);

                let x = base64_url_encode(&public_key);
                let decoding = DecodingKey::from_ed_components(&x).map_err(|e| {
                    TokenError::InvalidConfig(format!("Failed to create decoding key: {}", e))
                })?;

                let kid = base64_url_encode(&blake3_hash(&public_key)[..8]);

                Ok(Self {
                    algorithm: Algorithm::EdDSA,
                    encoding,
                    decoding,
                    kid: Some(kid.clone()),
                    public_jwk: Some(JsonWebKey {
                        kty: "OKP".to_string(),
                        use_: Some("sig".to_string()),
                        alg: Some("EdDSA".to_string()),
                        kid: Some(kid),
                        crv: "Ed25519".to_string(),
                        x,
                    }),
                })
            }
        }
    }

    /// Public keys for JWKS. Empty for HMAC, whose key is secret.
    pub(crate) fn jwks(&self) -> JwksResponse {
        JwksResponse {
            keys: self.public_jwk.iter().cloned().collect(),
        }
    }
}

use gatehouse_identity::Permissions;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use zeroize::Zeroizing;

pub use gatehouse_crypto::current_timestamp;

/// `typ` claim carried by every access token
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Minimum HMAC secret length in bytes
pub const MIN_HMAC_SECRET_LEN: usize = 32;

/// Default access token lifetime: 30 minutes
pub const DEFAULT_ACCESS_TOKEN_TTL: u64 = 30 * 60;

/// Default refresh token lifetime: 7 days
pub const DEFAULT_REFRESH_TOKEN_TTL: u64 = 7 * 24 * 60 * 60;

/// HMAC signing algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HmacAlgorithm {
    HS256,
    HS384,
    HS512,
}

/// Process-wide signing key
#[derive(Clone)]
pub enum SigningKeyConfig {
    /// Shared secret; validators need the same secret
    Hmac {
        algorithm: HmacAlgorithm,
        secret: Zeroizing<Vec<u8>>,
    },
    /// Ed25519 seed; the public half is published through JWKS
    EdDSA { seed: Zeroizing<[u8; 32]> },
}

impl fmt::Debug for SigningKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningKeyConfig::Hmac { algorithm, .. } => f
                .debug_struct("Hmac")
                .field("algorithm", algorithm)
                .field("secret", &"<redacted>")
                .finish(),
            SigningKeyConfig::EdDSA { .. } => f
                .debug_struct("EdDSA")
                .field("seed", &"<redacted>")
                .finish(),
        }
    }
}

/// Token service configuration, built once at startup
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub signing_key: SigningKeyConfig,
    pub issuer: String,
    pub audience: String,
    pub access_token_ttl: u64,  // seconds
    pub refresh_token_ttl: u64, // seconds
}

impl TokenConfig {
    /// Configuration with default issuer, audience and lifetimes
    pub fn new(signing_key: SigningKeyConfig) -> Self {
        Self {
            signing_key,
            issuer: "gatehouse".to_string(),
            audience: "gatehouse-services".to_string(),
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
        }
    }
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    // Standard claims
    pub iss: String, // Issuer
    pub sub: String, // Subject (user_id)
    pub aud: String, // Audience
    pub iat: u64,    // Issued at
    pub exp: u64,    // Expiration
    pub jti: String, // JWT ID

    // Custom claims
    pub typ: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_admin: bool,
    pub permissions: Permissions,
}

impl AccessClaims {
    /// Subject parsed as a user id
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

/// Why a refresh token record was revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevocationReason {
    /// Explicit logout
    Logout,
    /// Superseded by a successful renewal
    Rotated,
    /// Family revoked after a rotated token was presented again
    ReuseDetected,
    /// Bulk revocation for the user
    SecurityEvent,
}

/// Refresh token record stored in database
///
/// Keyed by the SHA-256 hash of the raw value; the raw value is never stored.
/// Records are only ever mutated to set `revoked`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub token_hash: [u8; 32],
    pub user_id: Uuid,
    pub family_id: Uuid,
    pub generation: u32,
    pub issued_at: u64,
    pub expires_at: u64,
    pub revoked: bool,
    pub revoked_at: Option<u64>,
    pub revoked_reason: Option<RevocationReason>,
}

impl RefreshTokenRecord {
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Copy of this record marked revoked
    pub fn revoked_copy(&self, reason: RevocationReason, now: u64) -> Self {
        Self {
            revoked: true,
            revoked_at: Some(now),
            revoked_reason: Some(reason),
            ..self.clone()
        }
    }
}

/// Token pair returned to client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,       // "Bearer"
    pub expires_in: u64,          // Seconds until access token expires
    pub refresh_expires_in: u64,  // Seconds until refresh token expires
    pub user_id: Uuid,
}

/// JWKS response for public key distribution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<JsonWebKey>,
}

/// JSON Web Key for JWKS endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKey {
    pub kty: String, // Key type: "OKP"
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>, // "sig"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>, // "EdDSA"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>, // Key ID
    pub crv: String, // Curve: "Ed25519"
    pub x: String,   // Base64url encoded public key
}

/// Revocation event handed to the event publisher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationEvent {
    pub event_type: RevocationEventType,
    pub user_id: Uuid,
    pub family_id: Option<Uuid>,
    pub revoked_count: usize,
    pub timestamp: u64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevocationEventType {
    /// A rotated refresh token was replayed; its family was revoked
    RefreshTokenReuse,
    /// Every refresh token of a user was revoked
    AllUserTokensRevoked,
}

//! OAuth state token and flow state.
//!
//! The `state` parameter sent to the provider is an opaque, URL-safe string
//! produced by [`StateToken::encode`]: a version byte followed by
//! length-prefixed fields, base64url encoded. Redirect targets may contain
//! any character without ambiguity.

use crate::errors::*;
use gatehouse_crypto::{base64_url_decode, base64_url_encode};
use serde::{Deserialize, Serialize};

/// Current state token layout
pub const STATE_TOKEN_VERSION: u8 = 1;

/// Encoded tokens longer than this are rejected before decoding
const MAX_STATE_TOKEN_LEN: usize = 4096;

/// Composite state token echoed back by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateToken {
    pub version: u8,
    pub nonce: String,
    pub provider: String,
    pub client_redirect: String,
    pub provider_redirect: String,
}

impl StateToken {
    pub fn new(
        nonce: String,
        provider: String,
        client_redirect: String,
        provider_redirect: String,
    ) -> Self {
        Self {
            version: STATE_TOKEN_VERSION,
            nonce,
            provider,
            client_redirect,
            provider_redirect,
        }
    }

    /// Encode to the opaque wire form
    pub fn encode(&self) -> Result<String> {
        let bytes = bincode::serialize(self).map_err(|e| {
            AuthMethodsError::OAuthConfigInvalid(format!("State token encoding failed: {}", e))
        })?;

        Ok(base64_url_encode(&bytes))
    }

    /// Decode the wire form. Any malformed input is `InvalidOrExpiredState`.
    pub fn decode(encoded: &str) -> Result<Self> {
        if encoded.is_empty() || encoded.len() > MAX_STATE_TOKEN_LEN {
            return Err(AuthMethodsError::InvalidOrExpiredState);
        }

        let bytes =
            base64_url_decode(encoded).map_err(|_| AuthMethodsError::InvalidOrExpiredState)?;
        let token: StateToken =
            bincode::deserialize(&bytes).map_err(|_| AuthMethodsError::InvalidOrExpiredState)?;

        if token.version != STATE_TOKEN_VERSION || token.nonce.is_empty() {
            return Err(AuthMethodsError::InvalidOrExpiredState);
        }

        Ok(token)
    }
}

/// Server-side record of an initiated login, keyed by nonce.
///
/// Single use: consumed atomically on the matching callback, and never
/// valid past `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthFlowState {
    pub nonce: String,
    pub provider: String,
    pub client_redirect: String,
    pub provider_redirect: String,
    pub created_at: u64,
    pub expires_at: u64,
}

impl OAuthFlowState {
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Whether a decoded state token describes this flow
    pub fn matches(&self, token: &StateToken) -> bool {
        self.nonce == token.nonce
            && self.provider == token.provider
            && self.client_redirect == token.client_redirect
            && self.provider_redirect == token.provider_redirect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_token() -> StateToken {
        StateToken::new(
            "nonce-123".to_string(),
            "github".to_string(),
            "https://app.example.com/done?tab=a|b&x=1".to_string(),
            "http://localhost:8008/callback/github".to_string(),
        )
    }

    #[test]
    fn test_encoded_token_is_url_safe() {
        let encoded = sample_token().encode().unwrap();

        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(StateToken::decode(&encoded).unwrap(), sample_token());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        for input in ["", "!!!", "bm90LWJpbmNvZGU", "AAAA"] {
            assert!(
                matches!(
                    StateToken::decode(input),
                    Err(AuthMethodsError::InvalidOrExpiredState)
                ),
                "input {:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_decode_rejects_oversized_token() {
        let huge = "A".repeat(MAX_STATE_TOKEN_LEN + 1);
        assert!(matches!(
            StateToken::decode(&huge),
            Err(AuthMethodsError::InvalidOrExpiredState)
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let mut token = sample_token();
        token.version = 9;
        let encoded = token.encode().unwrap();

        assert!(matches!(
            StateToken::decode(&encoded),
            Err(AuthMethodsError::InvalidOrExpiredState)
        ));
    }

    #[test]
    fn test_flow_state_matches_token() {
        let token = sample_token();
        let state = OAuthFlowState {
            nonce: token.nonce.clone(),
            provider: token.provider.clone(),
            client_redirect: token.client_redirect.clone(),
            provider_redirect: token.provider_redirect.clone(),
            created_at: 100,
            expires_at: 700,
        };

        assert!(state.matches(&token));
        assert!(!state.is_expired_at(699));
        assert!(state.is_expired_at(700));

        let mut tampered = token;
        tampered.client_redirect = "https://evil.example.com".to_string();
        assert!(!state.matches(&tampered));
    }
}

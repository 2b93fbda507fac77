//! Token issuance and verification for the token service.

use crate::{errors::*, types::*, EventPublisher};
use gatehouse_crypto::{base64_url_encode, generate_random_bytes, sha256};
use gatehouse_identity::{User, UserDirectory};
use gatehouse_storage::{
    BatchExt, Storage, CF_REFRESH_TOKENS, CF_REFRESH_TOKENS_BY_FAMILY, CF_REFRESH_TOKENS_BY_USER,
};
use jsonwebtoken::{decode, encode, Header, Validation};
use uuid::Uuid;

use super::TokenService;

impl<S, U, E> TokenService<S, U, E>
where
    S: Storage + 'static,
    U: UserDirectory + 'static,
    E: EventPublisher + 'static,
{
    /// Sign an access token for `user` issued at `now`
    pub(super) fn issue_access_token(&self, user: &User, now: u64) -> Result<String> {
        let claims = self.build_token_claims(user, now);

        let mut header = Header::new(self.keys.algorithm);
        header.kid = self.keys.kid.clone();

        Ok(encode(&header, &claims, &self.keys.encoding)?)
    }

    /// Validate an access token as of `now`.
    ///
    /// A token is expired from the instant `now == exp`. Signature, algorithm,
    /// issuer, audience and token type are checked before expiry, so a forged
    /// token is reported as `SignatureInvalid` even when its `exp` has passed.
    pub fn validate_access_token_at(&self, token: &str, now: u64) -> Result<AccessClaims> {
        let mut validation = Validation::new(self.keys.algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<AccessClaims>(token, &self.keys.decoding, &validation)
            .map_err(|_| TokenError::SignatureInvalid)?
            .claims;

        if claims.typ != ACCESS_TOKEN_TYPE {
            return Err(TokenError::SignatureInvalid);
        }

        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Generate a refresh token and persist its record with both indexes.
    ///
    /// Returns the raw value, which is never stored.
    pub(super) async fn generate_refresh_token(
        &self,
        user_id: Uuid,
        family_id: Uuid,
        generation: u32,
        now: u64,
    ) -> Result<String> {
        let refresh_token = base64_url_encode(&generate_random_bytes::<32>());
        let token_hash = sha256(refresh_token.as_bytes());

        let record = RefreshTokenRecord {
            token_hash,
            user_id,
            family_id,
            generation,
            issued_at: now,
            expires_at: now + self.refresh_token_ttl,
            revoked: false,
            revoked_at: None,
            revoked_reason: None,
        };

        let mut batch = self.storage.batch();
        batch.put(CF_REFRESH_TOKENS, &token_hash, &record)?;
        batch.put(CF_REFRESH_TOKENS_BY_USER, &(user_id, token_hash), &token_hash)?;
        batch.put(CF_REFRESH_TOKENS_BY_FAMILY, &(family_id, token_hash), &token_hash)?;
        batch.commit().await?;

        Ok(refresh_token)
    }

    fn build_token_claims(&self, user: &User, now: u64) -> AccessClaims {
        AccessClaims {
            iss: self.issuer.clone(),
            sub: user.user_id.to_string(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + self.access_token_ttl,
            jti: Uuid::new_v4().to_string(),
            typ: ACCESS_TOKEN_TYPE.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            permissions: user.permissions.clone(),
        }
    }
}

//! RocksDB column family definitions.

/// Users: user_id → User
pub const CF_USERS: &str = "users";

/// Users by provider identity: "provider:external_id" → user_id
pub const CF_USERS_BY_PROVIDER: &str = "users_by_provider";

/// Users by email: lowercase email → user_id
pub const CF_USERS_BY_EMAIL: &str = "users_by_email";

/// Refresh credentials: token_hash → RefreshTokenRecord
pub const CF_REFRESH_TOKENS: &str = "refresh_tokens";

/// Refresh credentials by user: (user_id, token_hash) → token_hash
pub const CF_REFRESH_TOKENS_BY_USER: &str = "refresh_tokens_by_user";

/// Refresh credentials by family: (family_id, token_hash) → token_hash
pub const CF_REFRESH_TOKENS_BY_FAMILY: &str = "refresh_tokens_by_family";

/// OAuth flow states: nonce → OAuthFlowState (TTL: 10 min)
pub const CF_OAUTH_STATES: &str = "oauth_states";

/// Get all column family names
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        CF_USERS,
        CF_USERS_BY_PROVIDER,
        CF_USERS_BY_EMAIL,
        CF_REFRESH_TOKENS,
        CF_REFRESH_TOKENS_BY_USER,
        CF_REFRESH_TOKENS_BY_FAMILY,
        CF_OAUTH_STATES,
    ]
}

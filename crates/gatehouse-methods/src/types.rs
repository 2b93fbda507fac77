//! Request and result types for the login methods.

use crate::errors::AuthMethodsError;
use gatehouse_identity::User;
use gatehouse_tokens::TokenPair;
use serde::{Deserialize, Serialize};

/// Result of starting an OAuth login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInitiation {
    /// Provider authorization URL to send the user-agent to
    pub auth_url: String,
    /// Opaque state token embedded in `auth_url`
    pub state: String,
}

/// Query parameters a provider sends to the callback
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Provider-reported failure such as `access_denied`
    pub error: Option<String>,
}

/// A completed login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub tokens: TokenPair,
}

/// Result of an OAuth callback. Both variants end in a redirect.
#[derive(Debug)]
pub enum CallbackOutcome {
    Success {
        redirect_url: String,
        login: LoginOutcome,
    },
    Failure {
        redirect_url: String,
        error: AuthMethodsError,
    },
}

impl CallbackOutcome {
    pub fn redirect_url(&self) -> &str {
        match self {
            CallbackOutcome::Success { redirect_url, .. }
            | CallbackOutcome::Failure { redirect_url, .. } => redirect_url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallbackOutcome::Success { .. })
    }
}

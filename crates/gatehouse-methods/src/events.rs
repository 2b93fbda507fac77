//! Security event reporting.

use async_trait::async_trait;
use gatehouse_tokens::{EventPublisher, RevocationEvent};
use tracing::{info, warn};
use uuid::Uuid;

/// Authentication events worth an operator's attention
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityEvent {
    /// Backup login rejected. Does not record which factor was wrong.
    BackupLoginFailed { username_hash: String },
    BackupLoginSucceeded { user_id: Uuid },
    /// OAuth callback ended in the error redirect
    OAuthCallbackFailed { provider: String, reason: String },
}

/// Sink for security events
#[async_trait]
pub trait SecurityEventSink: Send + Sync {
    async fn record(&self, event: SecurityEvent);
}

/// Writes security events to the `security` tracing target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSecurityEventSink;

#[async_trait]
impl SecurityEventSink for TracingSecurityEventSink {
    async fn record(&self, event: SecurityEvent) {
        match event {
            SecurityEvent::BackupLoginFailed { username_hash } => {
                warn!(target: "security", username_hash = %username_hash, "Backup login failed");
            }
            SecurityEvent::BackupLoginSucceeded { user_id } => {
                info!(target: "security", user_id = %user_id, "Backup login succeeded");
            }
            SecurityEvent::OAuthCallbackFailed { provider, reason } => {
                warn!(target: "security", provider = %provider, reason = %reason, "OAuth callback failed");
            }
        }
    }
}

#[async_trait]
impl EventPublisher for TracingSecurityEventSink {
    async fn publish_revocation_event(&self, event: RevocationEvent) -> gatehouse_tokens::Result<()> {
        warn!(
            target: "security",
            event_type = ?event.event_type,
            user_id = %event.user_id,
            family_id = ?event.family_id,
            revoked_count = event.revoked_count,
            reason = ?event.reason,
            "Refresh tokens revoked"
        );
        Ok(())
    }
}

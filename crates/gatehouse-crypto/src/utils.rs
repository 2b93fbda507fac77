//! Common utility functions for gatehouse cryptographic operations.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current Unix timestamp in seconds.
///
/// Every issuer and validator compares against this wall clock, so all
/// instances agree on expiry without sharing in-process state.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

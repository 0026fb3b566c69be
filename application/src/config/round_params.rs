//! Round parameters for use case timing control.
//!
//! [`RoundParams`] groups the static parameters that bound how long a round
//! operation may wait on its collaborators. These are application-layer
//! concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing limits for round and session operations.
///
/// | Limit | Applies to | Failure |
/// |-------|------------|---------|
/// | `store_timeout` | each store call | `StoreUnavailable` |
/// | `lock_timeout`  | entering a session's critical section | `StoreUnavailable` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundParams {
    /// Upper bound for a single store call.
    pub store_timeout: Duration,
    /// Upper bound for waiting on the per-session critical section.
    pub lock_timeout: Duration,
    /// Attempts at generating an unused session code before giving up.
    pub max_code_attempts: usize,
}

impl Default for RoundParams {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            lock_timeout: Duration::from_secs(10),
            max_code_attempts: 16,
        }
    }
}

impl RoundParams {
    // ==================== Builder Methods ====================

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_max_code_attempts(mut self, attempts: usize) -> Self {
        self.max_code_attempts = attempts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = RoundParams::default();
        assert_eq!(params.store_timeout, Duration::from_secs(5));
        assert_eq!(params.lock_timeout, Duration::from_secs(10));
        assert_eq!(params.max_code_attempts, 16);
    }

    #[test]
    fn test_builder() {
        let params = RoundParams::default()
            .with_store_timeout(Duration::from_millis(250))
            .with_lock_timeout(Duration::from_secs(1))
            .with_max_code_attempts(3);

        assert_eq!(params.store_timeout, Duration::from_millis(250));
        assert_eq!(params.lock_timeout, Duration::from_secs(1));
        assert_eq!(params.max_code_attempts, 3);
    }
}

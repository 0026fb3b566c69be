//! Round timing from TOML (`[round]` section)

use poker_application::RoundParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw round configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRoundConfig {
    /// Upper bound for one store call, in milliseconds
    pub store_timeout_ms: u64,
    /// Upper bound for waiting on a session's critical section, in milliseconds
    pub lock_timeout_ms: u64,
}

impl Default for FileRoundConfig {
    fn default() -> Self {
        let params = RoundParams::default();
        Self {
            store_timeout_ms: params.store_timeout.as_millis() as u64,
            lock_timeout_ms: params.lock_timeout.as_millis() as u64,
        }
    }
}

impl FileRoundConfig {
    pub fn to_round_params(&self) -> RoundParams {
        RoundParams::default()
            .with_store_timeout(Duration::from_millis(self.store_timeout_ms))
            .with_lock_timeout(Duration::from_millis(self.lock_timeout_ms))
    }
}

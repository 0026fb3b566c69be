//! Event delivery from TOML (`[notifier]` section)

use serde::{Deserialize, Serialize};

/// Raw notifier configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNotifierConfig {
    /// Per-session backlog of the broadcast channel
    pub channel_capacity: usize,
    /// Append every event to this JSONL file
    pub event_log: Option<String>,
}

impl Default for FileNotifierConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            event_log: None,
        }
    }
}

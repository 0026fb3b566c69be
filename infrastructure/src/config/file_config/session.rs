//! Session defaults from TOML (`[session]` section)

use poker_domain::{SessionSettings, SizingMethod};
use serde::{Deserialize, Serialize};

/// Settings applied to newly created sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Card deck: `fibonacci`, `t_shirt`, `powers_of_two`, `linear` or `custom:a,b,c`
    pub sizing: String,
    pub auto_reveal: bool,
    pub timer_enabled: bool,
    pub timer_duration_seconds: u32,
    pub allow_change_vote: bool,
    pub allow_observers: bool,
    pub require_confidence: bool,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        let settings = SessionSettings::default();
        Self {
            sizing: "fibonacci".to_string(),
            auto_reveal: settings.auto_reveal,
            timer_enabled: settings.timer_enabled,
            timer_duration_seconds: settings.timer_duration_seconds,
            allow_change_vote: settings.allow_change_vote,
            allow_observers: settings.allow_observers,
            require_confidence: settings.require_confidence,
        }
    }
}

impl FileSessionConfig {
    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            auto_reveal: self.auto_reveal,
            timer_enabled: self.timer_enabled,
            timer_duration_seconds: self.timer_duration_seconds,
            allow_change_vote: self.allow_change_vote,
            allow_observers: self.allow_observers,
            require_confidence: self.require_confidence,
        }
    }

    pub fn parse_sizing(&self) -> Result<SizingMethod, String> {
        self.sizing.parse()
    }
}

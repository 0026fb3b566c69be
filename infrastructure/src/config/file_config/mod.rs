//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to domain and application
//! types by their accessors.

mod logging;
mod notifier;
mod round;
mod session;

pub use logging::FileLoggingConfig;
pub use notifier::FileNotifierConfig;
pub use round::FileRoundConfig;
pub use session::FileSessionConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("round.{field} cannot be 0")]
    InvalidTimeout { field: &'static str },

    #[error("notifier.channel_capacity cannot be 0")]
    InvalidChannelCapacity,

    #[error("session.timer_duration_seconds cannot be 0")]
    InvalidTimerDuration,

    #[error("session.sizing: {0}")]
    InvalidSizing(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Defaults for new sessions
    pub session: FileSessionConfig,
    /// Store and lock timeouts
    pub round: FileRoundConfig,
    /// Event delivery
    pub notifier: FileNotifierConfig,
    /// Log file output
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if self.round.store_timeout_ms == 0 {
            issues.push(ConfigValidationError::InvalidTimeout {
                field: "store_timeout_ms",
            });
        }
        if self.round.lock_timeout_ms == 0 {
            issues.push(ConfigValidationError::InvalidTimeout {
                field: "lock_timeout_ms",
            });
        }
        if self.notifier.channel_capacity == 0 {
            issues.push(ConfigValidationError::InvalidChannelCapacity);
        }
        if self.session.timer_duration_seconds == 0 {
            issues.push(ConfigValidationError::InvalidTimerDuration);
        }
        if let Err(e) = self.session.parse_sizing() {
            issues.push(ConfigValidationError::InvalidSizing(e));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poker_domain::SizingMethod;
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[session]
sizing = "t_shirt"
auto_reveal = true
timer_enabled = true
timer_duration_seconds = 90
allow_change_vote = false

[round]
store_timeout_ms = 750
lock_timeout_ms = 2000

[notifier]
channel_capacity = 8
event_log = "logs/events.jsonl"

[logging]
directory = "logs"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.session.parse_sizing(), Ok(SizingMethod::TShirt));
        let settings = config.session.settings();
        assert!(settings.auto_reveal);
        assert!(settings.timer_enabled);
        assert_eq!(settings.timer_duration_seconds, 90);
        assert!(!settings.allow_change_vote);
        assert!(settings.allow_observers);

        let params = config.round.to_round_params();
        assert_eq!(params.store_timeout, Duration::from_millis(750));
        assert_eq!(params.lock_timeout, Duration::from_secs(2));

        assert_eq!(config.notifier.channel_capacity, 8);
        assert_eq!(config.notifier.event_log.as_deref(), Some("logs/events.jsonl"));
        assert_eq!(config.logging.directory.as_deref(), Some("logs"));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[session]
auto_reveal = true
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.session.auto_reveal);
        // Defaults should apply
        assert_eq!(config.session.timer_duration_seconds, 300);
        assert_eq!(config.round, FileRoundConfig::default());
        assert_eq!(config.notifier.channel_capacity, 64);
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.session.settings(), poker_domain::SessionSettings::default());
        assert_eq!(config.round.to_round_params(), poker_application::RoundParams::default());
    }

    #[test]
    fn test_validate_reports_every_issue() {
        let mut config = FileConfig::default();
        config.round.store_timeout_ms = 0;
        config.round.lock_timeout_ms = 0;
        config.notifier.channel_capacity = 0;
        config.session.timer_duration_seconds = 0;
        config.session.sizing = "dice".to_string();

        let issues = config.validate();
        assert_eq!(issues.len(), 5);
        assert_eq!(issues[0].to_string(), "round.store_timeout_ms cannot be 0");
        assert!(matches!(issues[4], ConfigValidationError::InvalidSizing(_)));
    }
}

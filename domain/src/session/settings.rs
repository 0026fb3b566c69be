//! Per-session settings and partial updates.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Default voting timer length.
pub const DEFAULT_TIMER_SECONDS: u32 = 300;

/// Settings that govern how a session's voting rounds behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Reveal automatically once every eligible voter has a ballot
    pub auto_reveal: bool,
    /// Show a countdown timer to participants
    pub timer_enabled: bool,
    /// Countdown length in seconds
    pub timer_duration_seconds: u32,
    /// Allow ballots to be changed after reveal
    pub allow_change_vote: bool,
    /// Allow users to join as observers
    pub allow_observers: bool,
    /// Every ballot must carry a confidence rating
    pub require_confidence: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            auto_reveal: false,
            timer_enabled: false,
            timer_duration_seconds: DEFAULT_TIMER_SECONDS,
            allow_change_vote: true,
            allow_observers: true,
            require_confidence: false,
        }
    }
}

impl SessionSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.timer_duration_seconds == 0 {
            return Err(DomainError::InvalidSettings(
                "timer_duration_seconds cannot be 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply a partial update, returning what kind of change happened.
    ///
    /// The update is validated before anything is written, so a rejected
    /// patch leaves the settings untouched.
    pub fn apply(&mut self, patch: &SettingsPatch) -> Result<SettingsChange, DomainError> {
        let mut next = *self;
        if let Some(v) = patch.auto_reveal {
            next.auto_reveal = v;
        }
        if let Some(v) = patch.timer_enabled {
            next.timer_enabled = v;
        }
        if let Some(v) = patch.timer_duration_seconds {
            next.timer_duration_seconds = v;
        }
        if let Some(v) = patch.allow_change_vote {
            next.allow_change_vote = v;
        }
        if let Some(v) = patch.allow_observers {
            next.allow_observers = v;
        }
        if let Some(v) = patch.require_confidence {
            next.require_confidence = v;
        }
        next.validate()?;
        *self = next;

        Ok(SettingsChange {
            timer_changed: patch.touches_timer(),
        })
    }
}

/// Partial settings update; `None` fields are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub auto_reveal: Option<bool>,
    pub timer_enabled: Option<bool>,
    pub timer_duration_seconds: Option<u32>,
    pub allow_change_vote: Option<bool>,
    pub allow_observers: Option<bool>,
    pub require_confidence: Option<bool>,
}

impl SettingsPatch {
    pub fn touches_timer(&self) -> bool {
        self.timer_enabled.is_some() || self.timer_duration_seconds.is_some()
    }

    pub fn with_auto_reveal(mut self, value: bool) -> Self {
        self.auto_reveal = Some(value);
        self
    }

    pub fn with_timer(mut self, enabled: bool, duration_seconds: u32) -> Self {
        self.timer_enabled = Some(enabled);
        self.timer_duration_seconds = Some(duration_seconds);
        self
    }

    pub fn with_allow_change_vote(mut self, value: bool) -> Self {
        self.allow_change_vote = Some(value);
        self
    }

    pub fn with_allow_observers(mut self, value: bool) -> Self {
        self.allow_observers = Some(value);
        self
    }

    pub fn with_require_confidence(mut self, value: bool) -> Self {
        self.require_confidence = Some(value);
        self
    }
}

/// Outcome of [`SessionSettings::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsChange {
    pub timer_changed: bool,
}

//! Ballot types for estimation rounds
//!
//! A [`Ballot`] is one user's current estimate for one story. There is at
//! most one live ballot per `(story, user)` key; resubmission replaces it.

use crate::core::error::DomainError;
use crate::core::ids::{StoryId, UserId};
use crate::core::time::current_timestamp;
use serde::{Deserialize, Serialize};

/// Free-form estimate token: a number (`"5"`, `"0.5"`) or a sentinel card
/// such as `"?"`, `"∞"` or `"☕"`.
///
/// ```
/// use poker_domain::voting::Estimate;
///
/// let five = Estimate::new("5").unwrap();
/// assert_eq!(five.numeric_value(), Some(5.0));
///
/// let unsure = Estimate::new("?").unwrap();
/// assert_eq!(unsure.numeric_value(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Estimate(String);

impl Estimate {
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::InvalidEstimate("estimate is required".to_string()));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parsed value when the token is a finite number.
    ///
    /// `NaN` and infinities parse as floats but are treated as sentinels.
    pub fn numeric_value(&self) -> Option<f64> {
        parse_numeric(&self.0)
    }
}

/// Parse a raw estimate string as a finite float
pub fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl TryFrom<String> for Estimate {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Estimate> for String {
    fn from(estimate: Estimate) -> Self {
        estimate.0
    }
}

impl std::fmt::Display for Estimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Voter's confidence in their estimate, 1 (guess) to 5 (certain)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, DomainError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(DomainError::InvalidConfidence(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Confidence {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for u8 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

/// One user's current estimate for one story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub story_id: StoryId,
    pub user_id: UserId,
    pub estimate: Estimate,
    pub confidence: Option<Confidence>,
    /// Milliseconds since epoch of the latest submission
    pub cast_at: u64,
}

impl Ballot {
    pub fn new(story_id: StoryId, user_id: UserId, estimate: Estimate) -> Self {
        Self {
            story_id,
            user_id,
            estimate,
            confidence: None,
            cast_at: current_timestamp(),
        }
    }

    pub fn with_confidence(mut self, confidence: Option<Confidence>) -> Self {
        self.confidence = confidence;
        self
    }

    /// Storage key; unique among live ballots
    pub fn key(&self) -> (StoryId, UserId) {
        (self.story_id, self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_rejects_blank() {
        assert!(Estimate::new("").is_err());
        assert!(Estimate::new("   ").is_err());
        assert!(Estimate::new("☕").is_ok());
    }

    #[test]
    fn test_numeric_parsing() {
        assert_eq!(parse_numeric("13"), Some(13.0));
        assert_eq!(parse_numeric(" 0.5 "), Some(0.5));
        assert_eq!(parse_numeric("?"), None);
        assert_eq!(parse_numeric("∞"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("inf"), None);
    }

    #[test]
    fn test_confidence_range() {
        assert!(Confidence::new(0).is_err());
        assert_eq!(Confidence::new(1).unwrap().get(), 1);
        assert_eq!(Confidence::new(5).unwrap().get(), 5);
        assert_eq!(Confidence::new(6), Err(DomainError::InvalidConfidence(6)));
    }

    #[test]
    fn test_confidence_deserialize_validates() {
        let ok: Confidence = serde_json::from_str("3").unwrap();
        assert_eq!(ok.get(), 3);
        assert!(serde_json::from_str::<Confidence>("9").is_err());
    }

    #[test]
    fn test_ballot_key() {
        let ballot = Ballot::new(StoryId::new(4), UserId::new(2), Estimate::new("8").unwrap())
            .with_confidence(Some(Confidence::new(4).unwrap()));
        assert_eq!(ballot.key(), (StoryId::new(4), UserId::new(2)));
        assert_eq!(ballot.confidence.map(|c| c.get()), Some(4));
    }
}

//! Identifiers for sessions, stories and users.
//!
//! - [`SessionCode`] - human-shareable code identifying an active session
//! - [`StoryId`] - store-assigned story identity
//! - [`UserId`] - store-assigned participant identity

use super::error::DomainError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Alphabet used for generated session codes.
pub const SESSION_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of every session code.
pub const SESSION_CODE_LENGTH: usize = 6;

/// Short, shareable code that identifies a session (e.g. `"K7Q2ZD"`).
///
/// Codes are fixed-length uppercase alphanumerics. Uniqueness among active
/// sessions is enforced by the store at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionCode(String);

impl SessionCode {
    /// Parses a code, normalizing to uppercase.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let code = raw.trim().to_ascii_uppercase();
        let valid = code.len() == SESSION_CODE_LENGTH
            && code.bytes().all(|b| SESSION_CODE_ALPHABET.contains(&b));
        if !valid {
            return Err(DomainError::InvalidSessionCode(raw.to_string()));
        }
        Ok(Self(code))
    }

    /// Generates a random code. Callers retry on collision.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let code = (0..SESSION_CODE_LENGTH)
            .map(|_| {
                let idx = rng.gen_range(0..SESSION_CODE_ALPHABET.len());
                SESSION_CODE_ALPHABET[idx] as char
            })
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionCode> for String {
    fn from(code: SessionCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for SessionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(u64);

impl StoryId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user within the whole system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_is_valid() {
        for _ in 0..50 {
            let code = SessionCode::generate();
            assert_eq!(code.as_str().len(), SESSION_CODE_LENGTH);
            assert!(SessionCode::parse(code.as_str()).is_ok());
        }
    }

    #[test]
    fn test_parse_normalizes_case() {
        let code = SessionCode::parse(" ab12cd ").unwrap();
        assert_eq!(code.as_str(), "AB12CD");
    }

    #[test]
    fn test_parse_rejects_bad_codes() {
        assert!(SessionCode::parse("ABC").is_err());
        assert!(SessionCode::parse("ABCDEFG").is_err());
        assert!(SessionCode::parse("AB-12C").is_err());
    }

    #[test]
    fn test_code_serde_roundtrip_validates() {
        let json = serde_json::to_string(&SessionCode::parse("QWERTY").unwrap()).unwrap();
        assert_eq!(json, "\"QWERTY\"");
        let bad: Result<SessionCode, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}

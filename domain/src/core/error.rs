//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Raised by entity constructors and state transitions. The application
/// layer maps these onto its caller-facing taxonomy without changing kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid estimate: {0}")]
    InvalidEstimate(String),

    #[error("Confidence must be between 1 and 5, got {0}")]
    InvalidConfidence(u8),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid session code: {0}")]
    InvalidSessionCode(String),

    #[error("Story cannot move from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

impl DomainError {
    /// Check if this error is a rejected state transition (as opposed to bad input)
    pub fn is_transition(&self) -> bool {
        matches!(self, DomainError::InvalidTransition { .. })
    }
}

//! Caller-facing error taxonomy for round and session operations

use crate::ports::identity::IdentityError;
use crate::ports::store::StoreError;
use poker_domain::{AccessError, DomainError, SessionCode};
use thiserror::Error;

/// Conventional status family an error surfaces as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Unavailable,
}

impl StatusClass {
    /// HTTP-style status code for this family
    pub fn code(&self) -> u16 {
        match self {
            StatusClass::BadRequest => 400,
            StatusClass::Unauthorized => 401,
            StatusClass::Forbidden => 403,
            StatusClass::NotFound => 404,
            StatusClass::Conflict => 409,
            StatusClass::Unavailable => 503,
        }
    }
}

/// Errors returned by round controller and session service operations
///
/// Kinds are never translated on the way out: a store `NotFound` stays
/// `NotFound`, a transient store failure stays `StoreUnavailable`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoundError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    SessionMembership(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("No active story in session {0}")]
    NoActiveStory(SessionCode),

    #[error("Vote changes are not allowed after reveal")]
    VoteLocked,

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl RoundError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        RoundError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        RoundError::Validation(message.into())
    }

    pub fn status_class(&self) -> StatusClass {
        match self {
            RoundError::NotFound { .. } => StatusClass::NotFound,
            RoundError::SessionMembership(_) | RoundError::Forbidden(_) => StatusClass::Forbidden,
            RoundError::NoActiveStory(_)
            | RoundError::VoteLocked
            | RoundError::InvalidTransition(_)
            | RoundError::Conflict(_) => StatusClass::Conflict,
            RoundError::Validation(_) => StatusClass::BadRequest,
            RoundError::Unauthenticated(_) => StatusClass::Unauthorized,
            RoundError::StoreUnavailable(_) => StatusClass::Unavailable,
        }
    }

    /// Only transient infrastructure failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, RoundError::StoreUnavailable(_))
    }
}

impl From<StoreError> for RoundError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { entity, id } => RoundError::NotFound { entity, id },
            StoreError::DuplicateKey(key) => RoundError::Conflict(format!("duplicate key {}", key)),
            StoreError::Unavailable(reason) => RoundError::StoreUnavailable(reason),
        }
    }
}

impl From<AccessError> for RoundError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::SessionMembership { .. } => RoundError::SessionMembership(error.to_string()),
            AccessError::Forbidden(reason) => RoundError::Forbidden(reason),
        }
    }
}

impl From<DomainError> for RoundError {
    fn from(error: DomainError) -> Self {
        if error.is_transition() {
            RoundError::InvalidTransition(error.to_string())
        } else {
            RoundError::Validation(error.to_string())
        }
    }
}

impl From<IdentityError> for RoundError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::Unauthenticated(reason) => RoundError::Unauthenticated(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert_eq!(RoundError::not_found("Story", 1).status_class().code(), 404);
        assert_eq!(RoundError::Forbidden("x".into()).status_class().code(), 403);
        assert_eq!(
            RoundError::SessionMembership("x".into()).status_class(),
            StatusClass::Forbidden
        );
        assert_eq!(RoundError::VoteLocked.status_class().code(), 409);
        assert_eq!(
            RoundError::NoActiveStory(SessionCode::parse("ABCDEF").unwrap())
                .status_class()
                .code(),
            409
        );
        assert_eq!(RoundError::validation("x").status_class().code(), 400);
        assert_eq!(RoundError::StoreUnavailable("x".into()).status_class().code(), 503);
    }

    #[test]
    fn test_store_errors_keep_their_kind() {
        let not_found: RoundError = StoreError::not_found("User", 7).into();
        assert_eq!(not_found, RoundError::not_found("User", 7));

        let unavailable: RoundError = StoreError::Unavailable("io".to_string()).into();
        assert!(unavailable.is_retryable());
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_domain_errors_map_by_kind() {
        let transition: RoundError = DomainError::InvalidTransition {
            from: "COMPLETED",
            to: "SKIPPED",
        }
        .into();
        assert!(matches!(transition, RoundError::InvalidTransition(_)));

        let validation: RoundError = DomainError::InvalidConfidence(0).into();
        assert!(matches!(validation, RoundError::Validation(_)));
    }

    #[test]
    fn test_access_errors_map_by_kind() {
        let membership: RoundError = AccessError::SessionMembership {
            entity: "Story",
            id: "3".to_string(),
            session: SessionCode::parse("ABCDEF").unwrap(),
        }
        .into();
        assert_eq!(
            membership,
            RoundError::SessionMembership("Story 3 does not belong to session ABCDEF".to_string())
        );
    }
}

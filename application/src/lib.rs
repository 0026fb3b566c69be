//! Application layer for planning-poker
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::RoundParams;
pub use ports::{
    identity::{IdentityError, IdentityProvider},
    notifier::{EventNotifier, NoNotifier, NotifyError},
    store::{BallotWrite, SessionLock, SessionStore, StoreError},
};
pub use use_cases::error::{RoundError, StatusClass};
pub use use_cases::round_controller::{CastBallotInput, CastOutcome, RoundController, VoteReveal};
pub use use_cases::session_service::{
    CreateSessionInput, LeaveOutcome, Membership, SessionService,
};

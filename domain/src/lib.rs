//! Domain layer for planning-poker
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on storage, transport or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Voting round
//!
//! A moderator selects one story at a time. Participants cast ballots while
//! they are hidden, the moderator (or auto-reveal) reveals them, and the
//! group settles on a final estimate:
//!
//! ```text
//! NOT_ESTIMATED ──activate──▶ VOTING ──reveal──▶ REVEALED ──finalize──▶ COMPLETED
//!       ▲                                           │
//!       └────────────────── reset ──────────────────┘
//! NOT_ESTIMATED ⇄ SKIPPED
//! ```
//!
//! ## Statistics
//!
//! [`VoteStatistics`] is a pure function of a story's ballots: distribution,
//! mean/median/mode, population standard deviation and the consensus flag.

pub mod access;
pub mod core;
pub mod events;
pub mod session;
pub mod voting;

// Re-export commonly used types
pub use access::{AccessError, Caller};
pub use core::{
    error::DomainError,
    ids::{SessionCode, StoryId, UserId},
};
pub use events::{SessionEvent, Topic};
pub use session::{
    NewStory, NewUser, Role, Session, SessionSettings, SettingsChange, SettingsPatch, SizingMethod,
    Story, StoryStatus, User,
};
pub use voting::{Ballot, Confidence, Distribution, Estimate, RoundState, VoteStatistics};

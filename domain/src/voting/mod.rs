//! Voting domain
//!
//! - [`ballot`]: estimates, confidence ratings and ballots
//! - [`statistics`]: distribution and numeric summary of a story's ballots
//! - [`round`]: the per-session round state (idle / voting / revealed)

pub mod ballot;
pub mod round;
pub mod statistics;

pub use ballot::{Ballot, Confidence, Estimate};
pub use round::RoundState;
pub use statistics::{Distribution, VoteStatistics};

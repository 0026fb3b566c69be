//! Identity provider port
//!
//! Turns inbound credentials into a verified [`Caller`] claim. The round
//! controller trusts the claim it is given; verification happens here.

use poker_domain::{Caller, SessionCode, UserId};
use thiserror::Error;

/// Errors that can occur while verifying credentials
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
}

/// Issues and verifies bearer credentials
pub trait IdentityProvider: Send + Sync {
    /// Issue a credential bound to `caller`
    fn issue(&self, caller: &Caller) -> String;

    /// Verify a credential, returning the claim it was issued for
    fn authenticate(&self, credential: &str) -> Result<Caller, IdentityError>;

    /// Invalidate every credential issued to `user` in `session`, returning
    /// how many were dropped
    fn revoke_user(&self, session: &SessionCode, user: UserId) -> usize;

    /// Invalidate every credential issued for `session`
    fn revoke_session(&self, session: &SessionCode) -> usize;
}

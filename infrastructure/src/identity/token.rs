//! Opaque bearer-token identity provider.
//!
//! Tokens are random v4 UUIDs mapped to the [`Caller`] claim they were issued
//! for. They live only as long as the process.

use dashmap::DashMap;
use poker_application::ports::identity::{IdentityError, IdentityProvider};
use poker_domain::{Caller, SessionCode, UserId};
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
pub struct TokenIdentityProvider {
    tokens: DashMap<String, Caller>,
}

impl TokenIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tokens(&self) -> usize {
        self.tokens.len()
    }
}

impl IdentityProvider for TokenIdentityProvider {
    fn issue(&self, caller: &Caller) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), caller.clone());
        debug!(
            "Issued token for user {} ({}) in session {}",
            caller.user_id, caller.role, caller.session_code
        );
        token
    }

    fn authenticate(&self, credential: &str) -> Result<Caller, IdentityError> {
        let credential = credential.trim();
        let credential = credential.strip_prefix("Bearer ").unwrap_or(credential);
        self.tokens
            .get(credential)
            .map(|caller| caller.clone())
            .ok_or_else(|| IdentityError::Unauthenticated("invalid or expired token".to_string()))
    }

    fn revoke_user(&self, session: &SessionCode, user: UserId) -> usize {
        let before = self.tokens.len();
        self.tokens
            .retain(|_, c| !(&c.session_code == session && c.user_id == user));
        let revoked = before.saturating_sub(self.tokens.len());
        debug!("Revoked {} token(s) of user {} in session {}", revoked, user, session);
        revoked
    }

    fn revoke_session(&self, session: &SessionCode) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|_, c| &c.session_code != session);
        let revoked = before.saturating_sub(self.tokens.len());
        debug!("Revoked {} token(s) for session {}", revoked, session);
        revoked
    }
}

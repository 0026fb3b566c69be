//! Session store port
//!
//! Defines the key-indexed storage the round controller runs against, plus
//! the per-session critical section that serializes round mutations.

use async_trait::async_trait;
use poker_domain::{
    Ballot, NewStory, NewUser, Session, SessionCode, Story, StoryId, User, UserId,
};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Transient failures are safe to retry
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Result of a conditional ballot write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallotWrite {
    /// No ballot existed for the key; one was created
    Inserted,
    /// An existing ballot was overwritten in place
    Replaced,
    /// A ballot existed and overwriting was not permitted; nothing changed
    Rejected,
}

impl BallotWrite {
    pub fn is_written(&self) -> bool {
        !matches!(self, BallotWrite::Rejected)
    }
}

/// Exclusive hold on one session's critical section
///
/// Dropping the lock leaves the critical section. The guard is opaque so
/// adapters can back it with an in-process mutex or a store transaction.
pub struct SessionLock {
    _guard: Box<dyn Send + Sync>,
}

impl SessionLock {
    pub fn new(guard: impl Send + Sync + 'static) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl std::fmt::Debug for SessionLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLock").finish_non_exhaustive()
    }
}

/// Key-indexed store for sessions, stories, users and ballots
///
/// Implementations live in the infrastructure layer.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Enter the critical section for `code`. Holders of different codes
    /// never contend.
    async fn enter_critical_section(&self, code: &SessionCode) -> Result<SessionLock, StoreError>;

    /// Forget the critical section of a closed session. May be called while
    /// the section is held; a held lock stays valid until dropped.
    async fn release_critical_section(&self, code: &SessionCode) -> Result<(), StoreError>;

    // ==================== Sessions ====================

    /// Insert a new session; fails `DuplicateKey` if the code is taken
    async fn insert_session(&self, session: Session) -> Result<(), StoreError>;

    async fn get_session(&self, code: &SessionCode) -> Result<Session, StoreError>;

    async fn save_session(&self, session: &Session) -> Result<(), StoreError>;

    // ==================== Stories ====================

    /// Insert a story, assigning its id and `order_index` (the session's
    /// current story count)
    async fn insert_story(&self, story: NewStory) -> Result<Story, StoreError>;

    async fn get_story(&self, id: StoryId) -> Result<Story, StoreError>;

    async fn save_story(&self, story: &Story) -> Result<(), StoreError>;

    /// Stories of a session ordered by `order_index`
    async fn list_stories(&self, code: &SessionCode) -> Result<Vec<Story>, StoreError>;

    // ==================== Users ====================

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get_user(&self, id: UserId) -> Result<User, StoreError>;

    async fn save_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_user_by_name(
        &self,
        code: &SessionCode,
        name: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn list_users(&self, code: &SessionCode) -> Result<Vec<User>, StoreError>;

    async fn count_active_non_observer_users(&self, code: &SessionCode) -> Result<usize, StoreError>;

    // ==================== Ballots ====================

    /// Atomically insert the ballot, or replace the existing one for the same
    /// `(story, user)` key when `overwrite` is true. Never creates a second
    /// ballot for a key.
    async fn upsert_ballot(&self, ballot: Ballot, overwrite: bool) -> Result<BallotWrite, StoreError>;

    /// Delete one ballot; `false` when there was none
    async fn delete_ballot(&self, story: StoryId, user: UserId) -> Result<bool, StoreError>;

    /// Delete every ballot for a story, returning how many were removed
    async fn delete_ballots_for_story(&self, story: StoryId) -> Result<usize, StoreError>;

    /// Ballots for a story in first-cast order
    async fn find_ballots_for_story(&self, story: StoryId) -> Result<Vec<Ballot>, StoreError>;
}

//! Hand-written port doubles shared by the use case tests.

use crate::ports::identity::{IdentityError, IdentityProvider};
use crate::ports::notifier::{EventNotifier, NotifyError};
use crate::ports::store::{BallotWrite, SessionLock, SessionStore, StoreError};
use async_trait::async_trait;
use poker_domain::{
    Ballot, Caller, NewStory, NewUser, Session, SessionCode, SessionEvent, Story, StoryId, User,
    UserId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Tables {
    sessions: HashMap<SessionCode, Session>,
    stories: HashMap<StoryId, Story>,
    users: HashMap<UserId, User>,
    ballots: Vec<Ballot>,
    next_id: u64,
}

/// In-memory `SessionStore` with optional injected latency
#[derive(Default)]
pub(crate) struct MockStore {
    tables: Mutex<Tables>,
    locks: Mutex<HashMap<SessionCode, Arc<tokio::sync::Mutex<()>>>>,
    session_delay: Mutex<Option<Duration>>,
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every `get_session` call sleep for `delay`
    pub(crate) fn stall_sessions(&self, delay: Duration) {
        *self.session_delay.lock().unwrap() = Some(delay);
    }

    pub(crate) fn has_lock(&self, code: &SessionCode) -> bool {
        self.locks.lock().unwrap().contains_key(code)
    }

    pub(crate) fn ballot_count(&self, story: StoryId) -> usize {
        let tables = self.tables.lock().unwrap();
        tables.ballots.iter().filter(|b| b.story_id == story).count()
    }

    fn next_id(tables: &mut Tables) -> u64 {
        tables.next_id += 1;
        tables.next_id
    }
}

#[async_trait]
impl SessionStore for MockStore {
    async fn enter_critical_section(&self, code: &SessionCode) -> Result<SessionLock, StoreError> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            Arc::clone(locks.entry(code.clone()).or_default())
        };
        Ok(SessionLock::new(lock.lock_owned().await))
    }

    async fn release_critical_section(&self, code: &SessionCode) -> Result<(), StoreError> {
        self.locks.lock().unwrap().remove(code);
        Ok(())
    }

    async fn insert_session(&self, session: Session) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.sessions.contains_key(&session.code) {
            return Err(StoreError::DuplicateKey(session.code.to_string()));
        }
        tables.sessions.insert(session.code.clone(), session);
        Ok(())
    }

    async fn get_session(&self, code: &SessionCode) -> Result<Session, StoreError> {
        let delay = *self.session_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let tables = self.tables.lock().unwrap();
        tables
            .sessions
            .get(code)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Session", code))
    }

    async fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        tables.sessions.insert(session.code.clone(), session.clone());
        Ok(())
    }

    async fn insert_story(&self, story: NewStory) -> Result<Story, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let order_index = tables
            .stories
            .values()
            .filter(|s| s.session_code == story.session_code)
            .count() as u32;
        let id = StoryId::new(Self::next_id(&mut tables));
        let story = Story::from_new(id, order_index, story);
        tables.stories.insert(id, story.clone());
        Ok(story)
    }

    async fn get_story(&self, id: StoryId) -> Result<Story, StoreError> {
        let tables = self.tables.lock().unwrap();
        tables
            .stories
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Story", id))
    }

    async fn save_story(&self, story: &Story) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        tables.stories.insert(story.id, story.clone());
        Ok(())
    }

    async fn list_stories(&self, code: &SessionCode) -> Result<Vec<Story>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut stories: Vec<Story> = tables
            .stories
            .values()
            .filter(|s| &s.session_code == code)
            .cloned()
            .collect();
        stories.sort_by_key(|s| s.order_index);
        Ok(stories)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let id = UserId::new(Self::next_id(&mut tables));
        let user = User::from_new(id, user);
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("User", id))
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_name(
        &self,
        code: &SessionCode,
        name: &str,
    ) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .values()
            .find(|u| &u.session_code == code && u.name == name)
            .cloned())
    }

    async fn list_users(&self, code: &SessionCode) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| &u.session_code == code)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn count_active_non_observer_users(&self, code: &SessionCode) -> Result<usize, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .values()
            .filter(|u| &u.session_code == code && u.is_eligible_voter())
            .count())
    }

    async fn upsert_ballot(&self, ballot: Ballot, overwrite: bool) -> Result<BallotWrite, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.ballots.iter_mut().find(|b| b.key() == ballot.key()) {
            Some(_) if !overwrite => Ok(BallotWrite::Rejected),
            Some(existing) => {
                *existing = ballot;
                Ok(BallotWrite::Replaced)
            }
            None => {
                tables.ballots.push(ballot);
                Ok(BallotWrite::Inserted)
            }
        }
    }

    async fn delete_ballot(&self, story: StoryId, user: UserId) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.ballots.len();
        tables.ballots.retain(|b| b.key() != (story, user));
        Ok(tables.ballots.len() != before)
    }

    async fn delete_ballots_for_story(&self, story: StoryId) -> Result<usize, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.ballots.len();
        tables.ballots.retain(|b| b.story_id != story);
        Ok(before - tables.ballots.len())
    }

    async fn find_ballots_for_story(&self, story: StoryId) -> Result<Vec<Ballot>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .ballots
            .iter()
            .filter(|b| b.story_id == story)
            .cloned()
            .collect())
    }
}

/// Notifier that records every published event
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    events: Mutex<Vec<SessionEvent>>,
    closed: Mutex<Vec<SessionCode>>,
    fail: bool,
}

impl RecordingNotifier {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.name()).collect()
    }

    pub(crate) fn count(&self, name: &str) -> usize {
        self.names().into_iter().filter(|n| *n == name).count()
    }

    pub(crate) fn closed(&self) -> Vec<SessionCode> {
        self.closed.lock().unwrap().clone()
    }
}

impl EventNotifier for RecordingNotifier {
    fn publish(&self, _session: &SessionCode, event: &SessionEvent) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event.clone());
        if self.fail {
            return Err(NotifyError::Delivery("subscriber gone".to_string()));
        }
        Ok(())
    }

    fn close(&self, session: &SessionCode) {
        self.closed.lock().unwrap().push(session.clone());
    }
}

/// Identity provider issuing sequential `token-N` credentials
#[derive(Default)]
pub(crate) struct MockIdentity {
    tokens: Mutex<HashMap<String, Caller>>,
    issued: AtomicUsize,
}

impl IdentityProvider for MockIdentity {
    fn issue(&self, caller: &Caller) -> String {
        let token = format!("token-{}", self.issued.fetch_add(1, Ordering::SeqCst) + 1);
        self.tokens
            .lock()
            .unwrap()
            .insert(token.clone(), caller.clone());
        token
    }

    fn authenticate(&self, credential: &str) -> Result<Caller, IdentityError> {
        self.tokens
            .lock()
            .unwrap()
            .get(credential)
            .cloned()
            .ok_or_else(|| IdentityError::Unauthenticated("unknown token".to_string()))
    }

    fn revoke_user(&self, session: &SessionCode, user: UserId) -> usize {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|_, c| !(&c.session_code == session && c.user_id == user));
        before - tokens.len()
    }

    fn revoke_session(&self, session: &SessionCode) -> usize {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|_, c| &c.session_code != session);
        before - tokens.len()
    }
}

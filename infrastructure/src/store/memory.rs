//! In-memory session store backed by concurrent maps.
//!
//! Every table is a [`DashMap`]; the per-session critical section is an async
//! mutex held in a map keyed by session code, so sessions never contend with
//! each other. Ballots are grouped per story and mutated under the shard lock
//! of that story's entry, which makes the conditional upsert atomic.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use poker_application::ports::store::{BallotWrite, SessionLock, SessionStore, StoreError};
use poker_domain::{
    Ballot, NewStory, NewUser, Session, SessionCode, Story, StoryId, User, UserId,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::trace;

/// Key-indexed store keeping everything in process memory
#[derive(Default)]
pub struct InMemoryStore {
    sessions: DashMap<SessionCode, Session>,
    stories: DashMap<StoryId, Story>,
    users: DashMap<UserId, User>,
    /// Story ids per session in insertion order
    session_stories: DashMap<SessionCode, Vec<StoryId>>,
    /// User ids per session in join order
    session_users: DashMap<SessionCode, Vec<UserId>>,
    /// Live ballots per story in first-cast order
    ballots: DashMap<StoryId, Vec<Ballot>>,
    locks: DashMap<SessionCode, Arc<Mutex<()>>>,
    next_story_id: AtomicU64,
    next_user_id: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn users_of(&self, code: &SessionCode) -> Vec<User> {
        self.session_users
            .get(code)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.users.get(id).map(|u| u.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn enter_critical_section(&self, code: &SessionCode) -> Result<SessionLock, StoreError> {
        let lock = Arc::clone(&*self.locks.entry(code.clone()).or_default());
        let guard = lock.lock_owned().await;
        trace!("Entered critical section for session {}", code);
        Ok(SessionLock::new(guard))
    }

    async fn release_critical_section(&self, code: &SessionCode) -> Result<(), StoreError> {
        if self.locks.remove(code).is_some() {
            trace!("Released critical section for session {}", code);
        }
        Ok(())
    }

    // ==================== Sessions ====================

    async fn insert_session(&self, session: Session) -> Result<(), StoreError> {
        match self.sessions.entry(session.code.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey(session.code.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(session);
                Ok(())
            }
        }
    }

    async fn get_session(&self, code: &SessionCode) -> Result<Session, StoreError> {
        self.sessions
            .get(code)
            .map(|s| s.clone())
            .ok_or_else(|| StoreError::not_found("Session", code))
    }

    async fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        match self.sessions.get_mut(&session.code) {
            Some(mut stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Session", &session.code)),
        }
    }

    // ==================== Stories ====================

    async fn insert_story(&self, story: NewStory) -> Result<Story, StoreError> {
        let mut ids = self.session_stories.entry(story.session_code.clone()).or_default();
        let order_index = ids.len() as u32;
        let id = StoryId::new(self.next_story_id.fetch_add(1, Ordering::Relaxed) + 1);
        let story = Story::from_new(id, order_index, story);

        ids.push(id);
        self.stories.insert(id, story.clone());
        Ok(story)
    }

    async fn get_story(&self, id: StoryId) -> Result<Story, StoreError> {
        self.stories
            .get(&id)
            .map(|s| s.clone())
            .ok_or_else(|| StoreError::not_found("Story", id))
    }

    async fn save_story(&self, story: &Story) -> Result<(), StoreError> {
        match self.stories.get_mut(&story.id) {
            Some(mut stored) => {
                *stored = story.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Story", story.id)),
        }
    }

    async fn list_stories(&self, code: &SessionCode) -> Result<Vec<Story>, StoreError> {
        let mut stories: Vec<Story> = self
            .session_stories
            .get(code)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.stories.get(id).map(|s| s.clone()))
                    .collect()
            })
            .unwrap_or_default();
        stories.sort_by_key(|s| s.order_index);
        Ok(stories)
    }

    // ==================== Users ====================

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut ids = self.session_users.entry(user.session_code.clone()).or_default();
        if ids
            .iter()
            .any(|id| self.users.get(id).is_some_and(|u| u.name == user.name))
        {
            return Err(StoreError::DuplicateKey(format!(
                "{}/{}",
                user.session_code, user.name
            )));
        }

        let id = UserId::new(self.next_user_id.fetch_add(1, Ordering::Relaxed) + 1);
        let user = User::from_new(id, user);
        ids.push(id);
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        self.users
            .get(&id)
            .map(|u| u.clone())
            .ok_or_else(|| StoreError::not_found("User", id))
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        match self.users.get_mut(&user.id) {
            Some(mut stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("User", user.id)),
        }
    }

    async fn find_user_by_name(
        &self,
        code: &SessionCode,
        name: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self.users_of(code).into_iter().find(|u| u.name == name))
    }

    async fn list_users(&self, code: &SessionCode) -> Result<Vec<User>, StoreError> {
        Ok(self.users_of(code))
    }

    async fn count_active_non_observer_users(&self, code: &SessionCode) -> Result<usize, StoreError> {
        Ok(self
            .users_of(code)
            .iter()
            .filter(|u| u.is_eligible_voter())
            .count())
    }

    // ==================== Ballots ====================

    async fn upsert_ballot(&self, ballot: Ballot, overwrite: bool) -> Result<BallotWrite, StoreError> {
        let mut ballots = self.ballots.entry(ballot.story_id).or_default();
        let write = match ballots.iter_mut().find(|b| b.key() == ballot.key()) {
            Some(_) if !overwrite => BallotWrite::Rejected,
            Some(existing) => {
                *existing = ballot;
                BallotWrite::Replaced
            }
            None => {
                ballots.push(ballot);
                BallotWrite::Inserted
            }
        };
        Ok(write)
    }

    async fn delete_ballot(&self, story: StoryId, user: UserId) -> Result<bool, StoreError> {
        let Some(mut ballots) = self.ballots.get_mut(&story) else {
            return Ok(false);
        };
        let before = ballots.len();
        ballots.retain(|b| b.user_id != user);
        Ok(ballots.len() != before)
    }

    async fn delete_ballots_for_story(&self, story: StoryId) -> Result<usize, StoreError> {
        Ok(self
            .ballots
            .remove(&story)
            .map(|(_, ballots)| ballots.len())
            .unwrap_or(0))
    }

    async fn find_ballots_for_story(&self, story: StoryId) -> Result<Vec<Ballot>, StoreError> {
        Ok(self
            .ballots
            .get(&story)
            .map(|ballots| ballots.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poker_application::ports::notifier::EventNotifier;
    use poker_application::{CastBallotInput, CreateSessionInput, RoundController, SessionService};
    use poker_domain::{Estimate, SessionSettings};
    use std::time::Duration;

    fn code(raw: &str) -> SessionCode {
        SessionCode::parse(raw).unwrap()
    }

    fn ballot(story: StoryId, user: UserId, estimate: &str) -> Ballot {
        Ballot::new(story, user, Estimate::new(estimate).unwrap())
    }

    #[tokio::test]
    async fn test_story_order_index_is_dense() {
        let store = InMemoryStore::new();
        for title in ["a", "b", "c"] {
            store
                .insert_story(NewStory::new(code("AAAAAA"), title, None).unwrap())
                .await
                .unwrap();
        }
        let other = store
            .insert_story(NewStory::new(code("BBBBBB"), "x", None).unwrap())
            .await
            .unwrap();

        let stories = store.list_stories(&code("AAAAAA")).await.unwrap();
        let indexes: Vec<u32> = stories.iter().map(|s| s.order_index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(other.order_index, 0);
    }

    #[tokio::test]
    async fn test_duplicate_session_code() {
        let store = InMemoryStore::new();
        let session = Session::new(
            code("DUPE00"),
            "s",
            Default::default(),
            SessionSettings::default(),
        )
        .unwrap();
        store.insert_session(session.clone()).await.unwrap();

        let err = store.insert_session(session).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey("DUPE00".to_string()));
    }

    #[tokio::test]
    async fn test_missing_entities_are_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.get_story(StoryId::new(9)).await,
            Err(StoreError::NotFound { entity: "Story", .. })
        ));
        assert!(matches!(
            store.get_user(UserId::new(9)).await,
            Err(StoreError::NotFound { entity: "User", .. })
        ));
        assert!(matches!(
            store.get_session(&code("ZZZZZZ")).await,
            Err(StoreError::NotFound { entity: "Session", .. })
        ));
    }

    #[tokio::test]
    async fn test_upsert_respects_overwrite_flag() {
        let store = InMemoryStore::new();
        let (story, user) = (StoryId::new(1), UserId::new(1));

        assert_eq!(
            store.upsert_ballot(ballot(story, user, "3"), false).await.unwrap(),
            BallotWrite::Inserted
        );
        assert_eq!(
            store.upsert_ballot(ballot(story, user, "5"), false).await.unwrap(),
            BallotWrite::Rejected
        );
        assert_eq!(
            store.upsert_ballot(ballot(story, user, "8"), true).await.unwrap(),
            BallotWrite::Replaced
        );

        let ballots = store.find_ballots_for_story(story).await.unwrap();
        assert_eq!(ballots.len(), 1);
        assert_eq!(ballots[0].estimate.as_str(), "8");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resubmissions_never_duplicate() {
        let store = Arc::new(InMemoryStore::new());
        let (story, user) = (StoryId::new(1), UserId::new(1));

        let casts = (0..32).map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .upsert_ballot(ballot(story, user, &i.to_string()), true)
                    .await
            })
        });
        for result in futures::future::join_all(casts).await {
            assert!(result.unwrap().unwrap().is_written());
        }

        assert_eq!(store.find_ballots_for_story(story).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_ballot_twice() {
        let store = InMemoryStore::new();
        let (story, user) = (StoryId::new(1), UserId::new(1));
        store.upsert_ballot(ballot(story, user, "3"), true).await.unwrap();

        assert!(store.delete_ballot(story, user).await.unwrap());
        assert!(!store.delete_ballot(story, user).await.unwrap());
        assert!(!store.delete_ballot(StoryId::new(2), user).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_ballots_for_story_counts() {
        let store = InMemoryStore::new();
        let story = StoryId::new(1);
        for user in 1..=3 {
            store
                .upsert_ballot(ballot(story, UserId::new(user), "5"), true)
                .await
                .unwrap();
        }
        store
            .upsert_ballot(ballot(StoryId::new(2), UserId::new(1), "5"), true)
            .await
            .unwrap();

        assert_eq!(store.delete_ballots_for_story(story).await.unwrap(), 3);
        assert_eq!(store.delete_ballots_for_story(story).await.unwrap(), 0);
        assert_eq!(store.find_ballots_for_story(StoryId::new(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_eligible_voter_count() {
        let store = InMemoryStore::new();
        let session = code("COUNT1");
        store
            .insert_user(NewUser::new(session.clone(), "Mod", true, false).unwrap())
            .await
            .unwrap();
        store
            .insert_user(NewUser::new(session.clone(), "Watcher", false, true).unwrap())
            .await
            .unwrap();
        let mut gone = store
            .insert_user(NewUser::new(session.clone(), "Gone", false, false).unwrap())
            .await
            .unwrap();
        gone.is_active = false;
        store.save_user(&gone).await.unwrap();

        assert_eq!(store.count_active_non_observer_users(&session).await.unwrap(), 1);
        assert_eq!(store.list_users(&session).await.unwrap().len(), 3);
        assert!(
            store
                .find_user_by_name(&session, "Gone")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_sessions_do_not_contend() {
        let store = InMemoryStore::new();
        let _held = store.enter_critical_section(&code("AAAAAA")).await.unwrap();

        let other = tokio::time::timeout(
            Duration::from_millis(100),
            store.enter_critical_section(&code("BBBBBB")),
        )
        .await;
        assert!(other.is_ok());

        let same = tokio::time::timeout(
            Duration::from_millis(50),
            store.enter_critical_section(&code("AAAAAA")),
        )
        .await;
        assert!(same.is_err());
    }

    #[tokio::test]
    async fn test_release_drops_lock_entry() {
        let store = InMemoryStore::new();
        let held = store.enter_critical_section(&code("AAAAAA")).await.unwrap();
        store.release_critical_section(&code("AAAAAA")).await.unwrap();
        assert!(store.locks.is_empty());

        // A later entrant gets a fresh section
        let again = tokio::time::timeout(
            Duration::from_millis(100),
            store.enter_critical_section(&code("AAAAAA")),
        )
        .await;
        assert!(again.is_ok());
        drop(held);
    }

    struct CountingNotifier {
        reveals: std::sync::atomic::AtomicUsize,
    }

    impl EventNotifier for CountingNotifier {
        fn publish(
            &self,
            _session: &SessionCode,
            event: &poker_domain::SessionEvent,
        ) -> Result<(), poker_application::NotifyError> {
            if matches!(event, poker_domain::SessionEvent::VotesRevealed { .. }) {
                self.reveals.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_last_voters_reveal_exactly_once() {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(CountingNotifier {
            reveals: Default::default(),
        });
        let identity = Arc::new(crate::identity::TokenIdentityProvider::new());
        let service = SessionService::new(Arc::clone(&store), identity)
            .with_notifier(notifier.clone());
        let controller =
            Arc::new(RoundController::new(Arc::clone(&store)).with_notifier(notifier.clone()));

        let settings = SessionSettings {
            auto_reveal: true,
            ..SessionSettings::default()
        };
        let created = service
            .create_session(CreateSessionInput::new("Race", "Mod").with_settings(settings))
            .await
            .unwrap();
        let code = created.session.code.clone();
        let story = service
            .add_story(&created.caller, &code, "Race story", None)
            .await
            .unwrap();
        controller.activate(&created.caller, &code, story.id).await.unwrap();

        let mut callers = vec![created.caller.clone()];
        for i in 0..15 {
            let joined = service
                .join_session(&code, format!("Voter {}", i), false)
                .await
                .unwrap();
            callers.push(joined.caller);
        }

        let mut join_set = tokio::task::JoinSet::new();
        for caller in callers {
            let controller = Arc::clone(&controller);
            let code = code.clone();
            join_set.spawn(async move {
                controller
                    .cast_ballot(&caller, &code, story.id, CastBallotInput::new(caller.user_id, "5"))
                    .await
            });
        }

        let mut revealed = 0;
        while let Some(result) = join_set.join_next().await {
            if result.unwrap().unwrap().auto_revealed.is_some() {
                revealed += 1;
            }
        }

        assert_eq!(revealed, 1);
        assert_eq!(notifier.reveals.load(Ordering::SeqCst), 1);
        assert!(store.get_session(&code).await.unwrap().votes_revealed());
        assert_eq!(store.find_ballots_for_story(story.id).await.unwrap().len(), 16);
    }
}

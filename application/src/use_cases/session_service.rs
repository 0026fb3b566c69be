//! Session Service use case
//!
//! Lifecycle around the voting round: creating and closing sessions, joining
//! and leaving, settings changes and the story backlog.
//!
//! Joins and leaves take the same per-session critical section as the round
//! controller, so the eligible-voter count seen by auto-reveal is never stale.

use crate::config::RoundParams;
use crate::ports::identity::IdentityProvider;
use crate::ports::notifier::{EventNotifier, NoNotifier};
use crate::ports::store::SessionStore;
use crate::use_cases::error::RoundError;
use crate::use_cases::round_controller::VoteReveal;
use crate::use_cases::shared::{self, call};
use poker_domain::access;
use poker_domain::session::entities::validate_name;
use poker_domain::{
    Caller, NewStory, NewUser, Session, SessionCode, SessionEvent, SessionSettings, SettingsPatch,
    SizingMethod, Story, User, UserId,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Input for creating a session
#[derive(Debug, Clone)]
pub struct CreateSessionInput {
    pub name: String,
    pub moderator_name: String,
    pub sizing: SizingMethod,
    pub settings: SessionSettings,
}

impl CreateSessionInput {
    pub fn new(name: impl Into<String>, moderator_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            moderator_name: moderator_name.into(),
            sizing: SizingMethod::default(),
            settings: SessionSettings::default(),
        }
    }

    pub fn with_sizing(mut self, sizing: SizingMethod) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// A user's seat in a session, with the credential issued for it
#[derive(Debug, Clone)]
pub struct Membership {
    pub session: Session,
    pub user: User,
    pub caller: Caller,
    pub token: String,
}

/// Result of leaving a session
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    pub user: User,
    /// Set when the departure completed the electorate of the current story
    pub auto_revealed: Option<VoteReveal>,
}

/// Use case for session lifecycle operations
pub struct SessionService<S: SessionStore + 'static> {
    store: Arc<S>,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn EventNotifier>,
    params: RoundParams,
}

impl<S: SessionStore + 'static> SessionService<S> {
    pub fn new(store: Arc<S>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store,
            identity,
            notifier: Arc::new(NoNotifier),
            params: RoundParams::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn EventNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_params(mut self, params: RoundParams) -> Self {
        self.params = params;
        self
    }

    /// Verify a credential issued by this service
    pub fn authenticate(&self, token: &str) -> Result<Caller, RoundError> {
        Ok(self.identity.authenticate(token)?)
    }

    /// Create a session under a fresh code with its moderator seated.
    pub async fn create_session(&self, input: CreateSessionInput) -> Result<Membership, RoundError> {
        let store = self.store.as_ref();
        let mut session = self.claim_code(&input).await?;
        let code = session.code.clone();

        let moderator = {
            let _lock = shared::enter(store, &self.params, &code).await?;
            let moderator = NewUser::new(code.clone(), input.moderator_name, true, false)?;
            let moderator =
                call(self.params.store_timeout, "insert_user", store.insert_user(moderator)).await?;
            session.moderator_id = Some(moderator.id);
            call(self.params.store_timeout, "save_session", store.save_session(&session)).await?;
            moderator
        };

        info!(
            "Session {} created by {} ({})",
            code,
            moderator.name,
            session.sizing.display_name()
        );
        Ok(self.membership(session, moderator))
    }

    async fn claim_code(&self, input: &CreateSessionInput) -> Result<Session, RoundError> {
        // Validate once so a bad name is not reported as a code collision
        validate_name(input.moderator_name.clone())?;

        for attempt in 1..=self.params.max_code_attempts {
            let session = Session::new(
                SessionCode::generate(),
                input.name.clone(),
                input.sizing.clone(),
                input.settings,
            )?;
            match call(
                self.params.store_timeout,
                "insert_session",
                self.store.insert_session(session.clone()),
            )
            .await
            {
                Ok(()) => return Ok(session),
                Err(RoundError::Conflict(_)) => {
                    debug!("Session code {} taken (attempt {})", session.code, attempt);
                }
                Err(e) => return Err(e),
            }
        }

        Err(RoundError::Conflict(format!(
            "no free session code after {} attempts",
            self.params.max_code_attempts
        )))
    }

    /// Join a session by name. Rejoining with a known name reactivates that
    /// user.
    pub async fn join_session(
        &self,
        code: &SessionCode,
        name: impl Into<String>,
        observer: bool,
    ) -> Result<Membership, RoundError> {
        let new_user = NewUser::new(code.clone(), name, false, observer)?;
        let store = self.store.as_ref();

        let (session, user) = {
            let _lock = shared::enter(store, &self.params, code).await?;
            let session = shared::load_active_session(store, &self.params, code).await?;
            if observer && !session.settings.allow_observers {
                return Err(RoundError::Forbidden(format!(
                    "session {} does not allow observers",
                    code
                )));
            }

            let existing = call(
                self.params.store_timeout,
                "find_user_by_name",
                store.find_user_by_name(code, &new_user.name),
            )
            .await?;
            let user = match existing {
                Some(mut user) => {
                    user.is_active = true;
                    user.is_observer = observer;
                    call(self.params.store_timeout, "save_user", store.save_user(&user)).await?;
                    debug!("User {} rejoined session {}", user.id, code);
                    user
                }
                None => call(self.params.store_timeout, "insert_user", store.insert_user(new_user)).await?,
            };
            (session, user)
        };

        info!("User {} ({}) joined session {}", user.id, user.name, code);
        shared::dispatch(
            self.notifier.as_ref(),
            code,
            vec![SessionEvent::UserJoined {
                user_id: user.id,
                name: user.name.clone(),
            }],
        );
        Ok(self.membership(session, user))
    }

    /// Mark a user inactive. Self or moderator.
    ///
    /// A departure can leave every remaining eligible voter with a ballot, so
    /// auto-reveal is re-evaluated for the current story.
    pub async fn leave_session(
        &self,
        caller: &Caller,
        code: &SessionCode,
        user_id: UserId,
    ) -> Result<LeaveOutcome, RoundError> {
        shared::caller_in(caller, code)?;
        access::require_self_or_moderator(caller, user_id)?;

        let store = self.store.as_ref();
        let (outcome, events) = {
            let _lock = shared::enter(store, &self.params, code).await?;
            let mut session = shared::load_active_session(store, &self.params, code).await?;
            let mut user = shared::load_user_in(store, &self.params, code, user_id).await?;

            user.is_active = false;
            call(self.params.store_timeout, "save_user", store.save_user(&user)).await?;
            let mut events = vec![SessionEvent::UserLeft {
                user_id: user.id,
                name: user.name.clone(),
            }];

            let mut auto_revealed = None;
            if let Some(story_id) = session.current_story_id() {
                let ballots = call(
                    self.params.store_timeout,
                    "find_ballots_for_story",
                    store.find_ballots_for_story(story_id),
                )
                .await?;
                if shared::auto_reveal_due(store, &self.params, &session, story_id, &ballots).await? {
                    auto_revealed =
                        Some(shared::apply_reveal(store, &self.params, &mut session).await?);
                    info!("Session {}: story {} auto-revealed after leave", code, story_id);
                    events.push(SessionEvent::VotesRevealed { story_id });
                }
            }

            (LeaveOutcome { user, auto_revealed }, events)
        };

        let revoked = self.identity.revoke_user(code, user_id);
        debug!("Revoked {} credential(s) of user {}", revoked, user_id);
        info!("User {} left session {}", user_id, code);
        shared::dispatch(self.notifier.as_ref(), code, events);
        Ok(outcome)
    }

    /// Apply a partial settings update. Moderator only.
    pub async fn update_settings(
        &self,
        caller: &Caller,
        code: &SessionCode,
        patch: SettingsPatch,
    ) -> Result<SessionSettings, RoundError> {
        shared::caller_in(caller, code)?;
        access::require_moderator(caller)?;

        let store = self.store.as_ref();
        let (settings, change) = {
            let _lock = shared::enter(store, &self.params, code).await?;
            let mut session = shared::load_active_session(store, &self.params, code).await?;
            let change = session.settings.apply(&patch)?;
            call(self.params.store_timeout, "save_session", store.save_session(&session)).await?;
            (session.settings, change)
        };

        info!("Session {}: settings updated", code);
        if change.timer_changed {
            shared::dispatch(
                self.notifier.as_ref(),
                code,
                vec![SessionEvent::TimerSettingsChanged {
                    enabled: settings.timer_enabled,
                    duration_seconds: settings.timer_duration_seconds,
                }],
            );
        }
        Ok(settings)
    }

    /// Soft-delete a session. Moderator only.
    ///
    /// Every credential issued for the session is revoked, and the store and
    /// notifier drop what they hold for it.
    pub async fn close_session(&self, caller: &Caller, code: &SessionCode) -> Result<(), RoundError> {
        shared::caller_in(caller, code)?;
        access::require_moderator(caller)?;

        let store = self.store.as_ref();
        {
            let _lock = shared::enter(store, &self.params, code).await?;
            let mut session = shared::load_active_session(store, &self.params, code).await?;
            session.is_active = false;
            call(self.params.store_timeout, "save_session", store.save_session(&session)).await?;
            call(
                self.params.store_timeout,
                "release_critical_section",
                store.release_critical_section(code),
            )
            .await?;
        }

        let revoked = self.identity.revoke_session(code);
        debug!("Revoked {} credential(s) of session {}", revoked, code);
        self.notifier.close(code);
        info!("Session {} closed", code);
        Ok(())
    }

    /// Append a story to the backlog. Moderator only.
    pub async fn add_story(
        &self,
        caller: &Caller,
        code: &SessionCode,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<Story, RoundError> {
        shared::caller_in(caller, code)?;
        access::require_moderator(caller)?;
        let new_story = NewStory::new(code.clone(), title, description)?;

        let store = self.store.as_ref();
        let _lock = shared::enter(store, &self.params, code).await?;
        shared::load_active_session(store, &self.params, code).await?;
        let story = call(self.params.store_timeout, "insert_story", store.insert_story(new_story)).await?;

        debug!(
            "Session {}: story {} added at position {}",
            code, story.id, story.order_index
        );
        Ok(story)
    }

    pub async fn get_session(&self, caller: &Caller, code: &SessionCode) -> Result<Session, RoundError> {
        shared::caller_in(caller, code)?;
        shared::load_active_session(self.store.as_ref(), &self.params, code).await
    }

    /// Stories of a session by `order_index`
    pub async fn list_stories(&self, caller: &Caller, code: &SessionCode) -> Result<Vec<Story>, RoundError> {
        shared::caller_in(caller, code)?;
        let store = self.store.as_ref();
        shared::load_active_session(store, &self.params, code).await?;
        call(self.params.store_timeout, "list_stories", store.list_stories(code)).await
    }

    pub async fn list_users(&self, caller: &Caller, code: &SessionCode) -> Result<Vec<User>, RoundError> {
        shared::caller_in(caller, code)?;
        let store = self.store.as_ref();
        shared::load_active_session(store, &self.params, code).await?;
        call(self.params.store_timeout, "list_users", store.list_users(code)).await
    }

    fn membership(&self, session: Session, user: User) -> Membership {
        let caller = Caller::new(session.code.clone(), user.id, user.role());
        let token = self.identity.issue(&caller);
        Membership {
            session,
            user,
            caller,
            token,
        }
    }
}

//! Round Controller use case
//!
//! Drives the voting round of a session: selecting a story, casting and
//! withdrawing ballots, revealing, resetting and finalizing.
//!
//! Every mutating operation runs inside the session's critical section,
//! spanning read, decide and write. Events are collected while the section is
//! held and published after it is left, so a failed delivery can never undo
//! or repeat a committed transition.

use crate::config::RoundParams;
use crate::ports::notifier::{EventNotifier, NoNotifier};
use crate::ports::store::{BallotWrite, SessionStore};
use crate::use_cases::error::RoundError;
use crate::use_cases::shared::{self, call};
use poker_domain::access;
use poker_domain::{
    Ballot, Caller, Confidence, Estimate, SessionCode, SessionEvent, Story, StoryId, UserId,
    VoteStatistics,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Ballots and statistics made visible by a reveal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteReveal {
    pub story_id: StoryId,
    pub ballots: Vec<Ballot>,
    pub statistics: VoteStatistics,
}

impl VoteReveal {
    pub fn new(story_id: StoryId, ballots: Vec<Ballot>) -> Self {
        let statistics = VoteStatistics::calculate(&ballots);
        Self {
            story_id,
            ballots,
            statistics,
        }
    }

    /// The mode of the revealed ballots
    pub fn recommended_estimate(&self) -> Option<&str> {
        self.statistics.recommended_estimate()
    }
}

/// Input for casting a ballot
#[derive(Debug, Clone)]
pub struct CastBallotInput {
    pub user_id: UserId,
    pub estimate: String,
    pub confidence: Option<u8>,
}

impl CastBallotInput {
    pub fn new(user_id: UserId, estimate: impl Into<String>) -> Self {
        Self {
            user_id,
            estimate: estimate.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Result of a successful cast
#[derive(Debug, Clone)]
pub struct CastOutcome {
    pub ballot: Ballot,
    pub write: BallotWrite,
    /// Live ballots for the story after this cast
    pub ballot_count: usize,
    /// Set when this cast completed the electorate and revealed the story
    pub auto_revealed: Option<VoteReveal>,
}

/// Use case for running voting rounds
pub struct RoundController<S: SessionStore + 'static> {
    store: Arc<S>,
    notifier: Arc<dyn EventNotifier>,
    params: RoundParams,
}

impl<S: SessionStore + 'static> RoundController<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
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

    pub fn params(&self) -> &RoundParams {
        &self.params
    }

    /// Select a story for voting with ballots hidden. Moderator only.
    pub async fn activate(
        &self,
        caller: &Caller,
        code: &SessionCode,
        story_id: StoryId,
    ) -> Result<Story, RoundError> {
        shared::caller_in(caller, code)?;
        access::require_moderator(caller)?;

        let store = self.store.as_ref();
        let story = {
            let _lock = shared::enter(store, &self.params, code).await?;
            let mut session = shared::load_active_session(store, &self.params, code).await?;
            let story = shared::load_story_in(store, &self.params, code, story_id).await?;

            session.activate_story(story_id);
            call(self.params.store_timeout, "save_session", store.save_session(&session)).await?;
            story
        };

        info!("Session {}: story {} activated", code, story_id);
        shared::dispatch(
            self.notifier.as_ref(),
            code,
            vec![SessionEvent::StoryActivated {
                story: story.clone(),
            }],
        );
        Ok(story)
    }

    /// Cast or change a ballot, revealing the story when auto-reveal is on
    /// and every eligible voter has voted.
    ///
    /// Ballots may be cast for any story of the session, not only the
    /// current one.
    pub async fn cast_ballot(
        &self,
        caller: &Caller,
        code: &SessionCode,
        story_id: StoryId,
        input: CastBallotInput,
    ) -> Result<CastOutcome, RoundError> {
        shared::caller_in(caller, code)?;
        access::require_self(caller, input.user_id)?;
        let estimate = Estimate::new(input.estimate)?;
        let confidence = input.confidence.map(Confidence::new).transpose()?;

        let store = self.store.as_ref();
        let (outcome, events) = {
            let _lock = shared::enter(store, &self.params, code).await?;
            let mut session = shared::load_active_session(store, &self.params, code).await?;
            if session.settings.require_confidence && confidence.is_none() {
                return Err(RoundError::validation("confidence rating is required"));
            }

            shared::load_story_in(store, &self.params, code, story_id).await?;
            let user = shared::load_user_in(store, &self.params, code, input.user_id).await?;
            if !user.is_eligible_voter() {
                return Err(RoundError::validation(format!(
                    "user {} is not an active voter",
                    user.id
                )));
            }

            let ballot = Ballot::new(story_id, user.id, estimate).with_confidence(confidence);
            // The reveal flag is session-wide: while any story is revealed,
            // no ballot in the session may change unless changes are allowed
            let overwrite = session.settings.allow_change_vote || !session.votes_revealed();
            let write = call(
                self.params.store_timeout,
                "upsert_ballot",
                store.upsert_ballot(ballot.clone(), overwrite),
            )
            .await?;
            if write == BallotWrite::Rejected {
                return Err(RoundError::VoteLocked);
            }

            let ballots = call(
                self.params.store_timeout,
                "find_ballots_for_story",
                store.find_ballots_for_story(story_id),
            )
            .await?;
            let ballot_count = ballots.len();
            debug!(
                "Session {}: user {} voted on story {} ({:?}, {} ballots)",
                code, user.id, story_id, write, ballot_count
            );

            let mut events = vec![SessionEvent::VoteCast {
                story_id,
                count: ballot_count,
            }];

            let auto_revealed =
                if shared::auto_reveal_due(store, &self.params, &session, story_id, &ballots)
                    .await?
                {
                    let reveal = shared::apply_reveal(store, &self.params, &mut session).await?;
                    info!("Session {}: story {} auto-revealed", code, story_id);
                    events.push(SessionEvent::VotesRevealed { story_id });
                    Some(reveal)
                } else {
                    None
                };

            (
                CastOutcome {
                    ballot,
                    write,
                    ballot_count,
                    auto_revealed,
                },
                events,
            )
        };

        shared::dispatch(self.notifier.as_ref(), code, events);
        Ok(outcome)
    }

    /// Reveal the current story's ballots. Moderator only.
    pub async fn reveal(&self, caller: &Caller, code: &SessionCode) -> Result<VoteReveal, RoundError> {
        shared::caller_in(caller, code)?;
        access::require_moderator(caller)?;

        let store = self.store.as_ref();
        let reveal = {
            let _lock = shared::enter(store, &self.params, code).await?;
            let mut session = shared::load_active_session(store, &self.params, code).await?;
            shared::apply_reveal(store, &self.params, &mut session).await?
        };

        info!(
            "Session {}: story {} revealed with {} ballots",
            code,
            reveal.story_id,
            reveal.ballots.len()
        );
        shared::dispatch(
            self.notifier.as_ref(),
            code,
            vec![SessionEvent::VotesRevealed {
                story_id: reveal.story_id,
            }],
        );
        Ok(reveal)
    }

    /// Clear the current story's ballots and hide the round. Moderator only.
    pub async fn reset_votes(&self, caller: &Caller, code: &SessionCode) -> Result<StoryId, RoundError> {
        shared::caller_in(caller, code)?;
        access::require_moderator(caller)?;

        let store = self.store.as_ref();
        let (story_id, removed) = {
            let _lock = shared::enter(store, &self.params, code).await?;
            let mut session = shared::load_active_session(store, &self.params, code).await?;
            let story_id = session
                .hide_current()
                .ok_or_else(|| RoundError::NoActiveStory(code.clone()))?;

            let removed = call(
                self.params.store_timeout,
                "delete_ballots_for_story",
                store.delete_ballots_for_story(story_id),
            )
            .await?;

            let mut story = call(self.params.store_timeout, "get_story", store.get_story(story_id)).await?;
            story.mark_votes_reset();
            call(self.params.store_timeout, "save_story", store.save_story(&story)).await?;
            call(self.params.store_timeout, "save_session", store.save_session(&session)).await?;
            (story_id, removed)
        };

        info!(
            "Session {}: votes reset for story {} ({} removed)",
            code, story_id, removed
        );
        shared::dispatch(
            self.notifier.as_ref(),
            code,
            vec![SessionEvent::VotesReset { story_id }],
        );
        Ok(story_id)
    }

    /// Record the final estimate of a story. Moderator only.
    ///
    /// The story need not be current and its ballots are kept.
    pub async fn finalize(
        &self,
        caller: &Caller,
        code: &SessionCode,
        story_id: StoryId,
        final_estimate: impl Into<String>,
        notes: Option<String>,
    ) -> Result<Story, RoundError> {
        shared::caller_in(caller, code)?;
        access::require_moderator(caller)?;

        let store = self.store.as_ref();
        let story = {
            let _lock = shared::enter(store, &self.params, code).await?;
            shared::load_active_session(store, &self.params, code).await?;
            let mut story = shared::load_story_in(store, &self.params, code, story_id).await?;
            story.finalize(final_estimate, notes)?;
            call(self.params.store_timeout, "save_story", store.save_story(&story)).await?;
            story
        };

        info!(
            "Session {}: story {} finalized at {}",
            code,
            story_id,
            story.final_estimate.as_deref().unwrap_or_default()
        );
        shared::dispatch(
            self.notifier.as_ref(),
            code,
            vec![SessionEvent::StoryFinalized {
                story: story.clone(),
            }],
        );
        Ok(story)
    }

    /// Return a story to a fresh state, deleting its ballots. Moderator only.
    pub async fn reset_story(
        &self,
        caller: &Caller,
        code: &SessionCode,
        story_id: StoryId,
    ) -> Result<Story, RoundError> {
        shared::caller_in(caller, code)?;
        access::require_moderator(caller)?;

        let store = self.store.as_ref();
        let story = {
            let _lock = shared::enter(store, &self.params, code).await?;
            let mut session = shared::load_active_session(store, &self.params, code).await?;
            let mut story = shared::load_story_in(store, &self.params, code, story_id).await?;

            call(
                self.params.store_timeout,
                "delete_ballots_for_story",
                store.delete_ballots_for_story(story_id),
            )
            .await?;
            story.reset();
            call(self.params.store_timeout, "save_story", store.save_story(&story)).await?;

            if session.round().is_current(story_id) && session.votes_revealed() {
                session.hide_current();
                call(self.params.store_timeout, "save_session", store.save_session(&session)).await?;
            }
            story
        };

        info!("Session {}: story {} reset", code, story_id);
        shared::dispatch(
            self.notifier.as_ref(),
            code,
            vec![SessionEvent::StoryReset {
                story: story.clone(),
            }],
        );
        Ok(story)
    }

    /// Delete a ballot. Owner or moderator; withdrawing nothing succeeds.
    ///
    /// Returns whether a ballot was removed.
    pub async fn withdraw_ballot(
        &self,
        caller: &Caller,
        code: &SessionCode,
        story_id: StoryId,
        user_id: UserId,
    ) -> Result<bool, RoundError> {
        shared::caller_in(caller, code)?;
        access::require_self_or_moderator(caller, user_id)?;

        let store = self.store.as_ref();
        let _lock = shared::enter(store, &self.params, code).await?;
        shared::load_active_session(store, &self.params, code).await?;
        shared::load_story_in(store, &self.params, code, story_id).await?;
        shared::load_user_in(store, &self.params, code, user_id).await?;

        let removed = call(
            self.params.store_timeout,
            "delete_ballot",
            store.delete_ballot(story_id, user_id),
        )
        .await?;
        debug!(
            "Session {}: ballot of user {} on story {} withdrawn (existed: {})",
            code, user_id, story_id, removed
        );
        Ok(removed)
    }

    /// `NOT_ESTIMATED -> SKIPPED`. Moderator only.
    pub async fn skip_story(
        &self,
        caller: &Caller,
        code: &SessionCode,
        story_id: StoryId,
    ) -> Result<Story, RoundError> {
        self.change_status(caller, code, story_id, |story| story.skip())
            .await
    }

    /// `SKIPPED -> NOT_ESTIMATED`. Moderator only.
    pub async fn unskip_story(
        &self,
        caller: &Caller,
        code: &SessionCode,
        story_id: StoryId,
    ) -> Result<Story, RoundError> {
        self.change_status(caller, code, story_id, |story| story.unskip())
            .await
    }

    async fn change_status<F>(
        &self,
        caller: &Caller,
        code: &SessionCode,
        story_id: StoryId,
        transition: F,
    ) -> Result<Story, RoundError>
    where
        F: FnOnce(&mut Story) -> Result<(), poker_domain::DomainError>,
    {
        shared::caller_in(caller, code)?;
        access::require_moderator(caller)?;

        let store = self.store.as_ref();
        let _lock = shared::enter(store, &self.params, code).await?;
        shared::load_active_session(store, &self.params, code).await?;
        let mut story = shared::load_story_in(store, &self.params, code, story_id).await?;
        transition(&mut story)?;
        call(self.params.store_timeout, "save_story", store.save_story(&story)).await?;

        info!(
            "Session {}: story {} is now {}",
            code,
            story_id,
            story.status.as_str()
        );
        Ok(story)
    }

    /// Ballots cast on a story, in first-cast order.
    ///
    /// With `revealed_only`, hidden ballots are not returned: the list is
    /// empty unless the story is the session's revealed story.
    pub async fn list_ballots(
        &self,
        caller: &Caller,
        code: &SessionCode,
        story_id: StoryId,
        revealed_only: bool,
    ) -> Result<Vec<Ballot>, RoundError> {
        shared::caller_in(caller, code)?;

        let store = self.store.as_ref();
        let session = shared::load_active_session(store, &self.params, code).await?;
        shared::load_story_in(store, &self.params, code, story_id).await?;
        if revealed_only && !session.round().is_revealed(story_id) {
            return Ok(Vec::new());
        }

        call(
            self.params.store_timeout,
            "find_ballots_for_story",
            store.find_ballots_for_story(story_id),
        )
        .await
    }
}

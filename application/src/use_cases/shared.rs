//! Shared helpers for the round controller and session service.
//!
//! Bounded store calls, critical-section entry, guarded loads, the reveal
//! transition used by both the explicit and the automatic path, and event
//! dispatch after the critical section has been left.

use crate::config::RoundParams;
use crate::ports::notifier::EventNotifier;
use crate::ports::store::{SessionLock, SessionStore, StoreError};
use crate::use_cases::error::RoundError;
use crate::use_cases::round_controller::VoteReveal;
use poker_domain::access::{self, AccessError};
use poker_domain::{
    Ballot, Caller, Session, SessionCode, SessionEvent, Story, StoryId, User, UserId,
};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Await a store call, failing `StoreUnavailable` once `limit` elapses.
pub(crate) async fn call<T, F>(limit: Duration, what: &'static str, fut: F) -> Result<T, RoundError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(RoundError::from),
        Err(_) => Err(RoundError::StoreUnavailable(format!(
            "{} timed out after {}ms",
            what,
            limit.as_millis()
        ))),
    }
}

/// Enter the per-session critical section within `lock_timeout`.
pub(crate) async fn enter<S: SessionStore + ?Sized>(
    store: &S,
    params: &RoundParams,
    code: &SessionCode,
) -> Result<SessionLock, RoundError> {
    call(
        params.lock_timeout,
        "enter_critical_section",
        store.enter_critical_section(code),
    )
    .await
}

/// Load a session; closed sessions are reported as absent.
///
/// A closed session never reopens, so a critical section entered for it
/// after the close is released again here.
pub(crate) async fn load_active_session<S: SessionStore + ?Sized>(
    store: &S,
    params: &RoundParams,
    code: &SessionCode,
) -> Result<Session, RoundError> {
    let session = call(params.store_timeout, "get_session", store.get_session(code)).await?;
    if !session.is_active {
        call(
            params.store_timeout,
            "release_critical_section",
            store.release_critical_section(code),
        )
        .await?;
        return Err(RoundError::not_found("Session", code));
    }
    Ok(session)
}

/// Load a story and check it belongs to `code`.
pub(crate) async fn load_story_in<S: SessionStore + ?Sized>(
    store: &S,
    params: &RoundParams,
    code: &SessionCode,
    story_id: StoryId,
) -> Result<Story, RoundError> {
    let story = call(params.store_timeout, "get_story", store.get_story(story_id)).await?;
    guarded(access::require_story_in_session(&story, code))?;
    Ok(story)
}

/// Load a user and check they belong to `code`.
pub(crate) async fn load_user_in<S: SessionStore + ?Sized>(
    store: &S,
    params: &RoundParams,
    code: &SessionCode,
    user_id: UserId,
) -> Result<User, RoundError> {
    let user = call(params.store_timeout, "get_user", store.get_user(user_id)).await?;
    guarded(access::require_user_in_session(&user, code))?;
    Ok(user)
}

/// The caller's claim must be for `code`.
pub(crate) fn caller_in(caller: &Caller, code: &SessionCode) -> Result<(), RoundError> {
    guarded(access::require_caller_in_session(caller, code))
}

/// Convert an access guard result, logging membership violations.
pub(crate) fn guarded(result: Result<(), AccessError>) -> Result<(), RoundError> {
    result.map_err(|error| {
        if matches!(error, AccessError::SessionMembership { .. }) {
            warn!("Possible access violation: {}", error);
        }
        RoundError::from(error)
    })
}

/// Reveal the session's current story and compute its statistics.
///
/// Must be called inside the session's critical section. Revealing an
/// already revealed story recomputes the same statistics.
pub(crate) async fn apply_reveal<S: SessionStore + ?Sized>(
    store: &S,
    params: &RoundParams,
    session: &mut Session,
) -> Result<VoteReveal, RoundError> {
    let story_id = session
        .reveal_current()
        .ok_or_else(|| RoundError::NoActiveStory(session.code.clone()))?;

    let mut story = call(params.store_timeout, "get_story", store.get_story(story_id)).await?;
    story.mark_revealed();
    call(params.store_timeout, "save_story", store.save_story(&story)).await?;
    call(params.store_timeout, "save_session", store.save_session(session)).await?;

    let ballots = call(
        params.store_timeout,
        "find_ballots_for_story",
        store.find_ballots_for_story(story_id),
    )
    .await?;

    Ok(VoteReveal::new(story_id, ballots))
}

/// Whether auto-reveal should fire for `story_id` given its live ballots.
///
/// Fires only for the current, still hidden story, and only when every
/// currently eligible voter holds a ballot. Eligibility is read inside the
/// same critical section that serializes joins and leaves.
pub(crate) async fn auto_reveal_due<S: SessionStore + ?Sized>(
    store: &S,
    params: &RoundParams,
    session: &Session,
    story_id: StoryId,
    ballots: &[Ballot],
) -> Result<bool, RoundError> {
    if !session.settings.auto_reveal || !session.round().is_voting_on(story_id) {
        return Ok(false);
    }

    let eligible = call(
        params.store_timeout,
        "count_active_non_observer_users",
        store.count_active_non_observer_users(&session.code),
    )
    .await?;
    if eligible == 0 || ballots.len() < eligible {
        debug!(
            "Auto-reveal pending for story {}: {}/{} ballots",
            story_id,
            ballots.len(),
            eligible
        );
        return Ok(false);
    }

    // Ballots of users who left still count toward the total, so the count
    // alone can overshoot. Check every eligible voter individually.
    let users = call(params.store_timeout, "list_users", store.list_users(&session.code)).await?;
    let voted: HashSet<UserId> = ballots.iter().map(|b| b.user_id).collect();
    Ok(users
        .iter()
        .filter(|u| u.is_eligible_voter())
        .all(|u| voted.contains(&u.id)))
}

/// Publish events collected during a committed transition.
///
/// Delivery failures are logged and dropped.
pub(crate) fn dispatch(notifier: &dyn EventNotifier, code: &SessionCode, events: Vec<SessionEvent>) {
    for event in events {
        if let Err(e) = notifier.publish(code, &event) {
            warn!(
                "Dropped {} event for session {} on /{}: {}",
                event.name(),
                code,
                event.topic(),
                e
            );
        }
    }
}

//! Session, story and user entities

use super::settings::SessionSettings;
use super::sizing::SizingMethod;
use crate::core::error::DomainError;
use crate::core::ids::{SessionCode, StoryId, UserId};
use crate::core::time::current_timestamp;
use crate::voting::round::RoundState;
use serde::{Deserialize, Serialize};

/// Maximum length of a participant name
pub const MAX_NAME_LEN: usize = 50;

/// Maximum length of a story title
pub const MAX_TITLE_LEN: usize = 200;

/// One estimation meeting (Entity)
///
/// The round state is private: callers read the legacy flags through
/// [`Session::current_story_id`] and [`Session::votes_revealed`] and change
/// them only through the transition methods. Serialized, the round is the
/// `current_story_id` / `votes_revealed` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "SessionRecord", try_from = "SessionRecord")]
pub struct Session {
    pub code: SessionCode,
    pub name: String,
    pub moderator_id: Option<UserId>,
    pub sizing: SizingMethod,
    pub settings: SessionSettings,
    pub is_active: bool,
    round: RoundState,
    pub created_at: u64,
}

impl Session {
    pub fn new(
        code: SessionCode,
        name: impl Into<String>,
        sizing: SizingMethod,
        settings: SessionSettings,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidName("session name is required".to_string()));
        }
        settings.validate()?;

        Ok(Self {
            code,
            name,
            moderator_id: None,
            sizing,
            settings,
            is_active: true,
            round: RoundState::Idle,
            created_at: current_timestamp(),
        })
    }

    pub fn round(&self) -> RoundState {
        self.round
    }

    pub fn current_story_id(&self) -> Option<StoryId> {
        self.round.current_story_id()
    }

    pub fn votes_revealed(&self) -> bool {
        self.round.votes_revealed()
    }

    /// Select `story_id` for voting with ballots hidden
    pub fn activate_story(&mut self, story_id: StoryId) {
        self.round = RoundState::activate(story_id);
    }

    /// Reveal the current story, returning its id
    pub fn reveal_current(&mut self) -> Option<StoryId> {
        let next = self.round.reveal()?;
        self.round = next;
        next.current_story_id()
    }

    /// Hide ballots of the current story, returning its id
    pub fn hide_current(&mut self) -> Option<StoryId> {
        let next = self.round.hide()?;
        self.round = next;
        next.current_story_id()
    }
}

/// Stored shape of a [`Session`]
#[derive(Serialize, Deserialize)]
struct SessionRecord {
    code: SessionCode,
    name: String,
    moderator_id: Option<UserId>,
    sizing: SizingMethod,
    settings: SessionSettings,
    is_active: bool,
    current_story_id: Option<StoryId>,
    votes_revealed: bool,
    created_at: u64,
}

impl From<Session> for SessionRecord {
    fn from(session: Session) -> Self {
        let (current_story_id, votes_revealed) = session.round.flags();
        Self {
            code: session.code,
            name: session.name,
            moderator_id: session.moderator_id,
            sizing: session.sizing,
            settings: session.settings,
            is_active: session.is_active,
            current_story_id,
            votes_revealed,
            created_at: session.created_at,
        }
    }
}

impl TryFrom<SessionRecord> for Session {
    type Error = DomainError;

    fn try_from(record: SessionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            round: RoundState::from_flags(record.current_story_id, record.votes_revealed)?,
            code: record.code,
            name: record.name,
            moderator_id: record.moderator_id,
            sizing: record.sizing,
            settings: record.settings,
            is_active: record.is_active,
            created_at: record.created_at,
        })
    }
}

/// Estimation status of a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoryStatus {
    #[default]
    NotEstimated,
    InProgress,
    Completed,
    Skipped,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::NotEstimated => "NOT_ESTIMATED",
            StoryStatus::InProgress => "IN_PROGRESS",
            StoryStatus::Completed => "COMPLETED",
            StoryStatus::Skipped => "SKIPPED",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StoryStatus::NotEstimated => "Not Estimated",
            StoryStatus::InProgress => "In Progress",
            StoryStatus::Completed => "Completed",
            StoryStatus::Skipped => "Skipped",
        }
    }
}

impl std::fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Fields for a story the store has not assigned an id to yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStory {
    pub session_code: SessionCode,
    pub title: String,
    pub description: Option<String>,
}

impl NewStory {
    pub fn new(
        session_code: SessionCode,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        let len = title.trim().chars().count();
        if len == 0 || len > MAX_TITLE_LEN {
            return Err(DomainError::InvalidTitle(format!(
                "title must be between 1 and {} characters",
                MAX_TITLE_LEN
            )));
        }
        Ok(Self {
            session_code,
            title,
            description,
        })
    }
}

/// One backlog item being estimated (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub session_code: SessionCode,
    pub title: String,
    pub description: Option<String>,
    /// Position assigned at creation; never reused
    pub order_index: u32,
    pub status: StoryStatus,
    pub final_estimate: Option<String>,
    pub estimate_notes: Option<String>,
    pub updated_at: u64,
}

impl Story {
    /// Materialize a story once the store has assigned its id and position
    pub fn from_new(id: StoryId, order_index: u32, new: NewStory) -> Self {
        Self {
            id,
            session_code: new.session_code,
            title: new.title,
            description: new.description,
            order_index,
            status: StoryStatus::NotEstimated,
            final_estimate: None,
            estimate_notes: None,
            updated_at: current_timestamp(),
        }
    }

    pub fn belongs_to(&self, code: &SessionCode) -> bool {
        &self.session_code == code
    }

    /// Ballots were revealed; from any status
    pub fn mark_revealed(&mut self) {
        self.set_status(StoryStatus::InProgress);
    }

    /// Ballots were cleared; the estimate itself is kept
    pub fn mark_votes_reset(&mut self) {
        self.set_status(StoryStatus::NotEstimated);
    }

    /// Record the group's final estimate; from any status
    pub fn finalize(
        &mut self,
        final_estimate: impl Into<String>,
        notes: Option<String>,
    ) -> Result<(), DomainError> {
        let final_estimate = final_estimate.into();
        if final_estimate.trim().is_empty() {
            return Err(DomainError::InvalidEstimate(
                "final estimate is required".to_string(),
            ));
        }
        self.final_estimate = Some(final_estimate);
        self.estimate_notes = notes;
        self.set_status(StoryStatus::Completed);
        Ok(())
    }

    /// Back to a fresh, unestimated story
    pub fn reset(&mut self) {
        self.final_estimate = None;
        self.estimate_notes = None;
        self.set_status(StoryStatus::NotEstimated);
    }

    pub fn skip(&mut self) -> Result<(), DomainError> {
        self.transition(StoryStatus::NotEstimated, StoryStatus::Skipped)
    }

    pub fn unskip(&mut self) -> Result<(), DomainError> {
        self.transition(StoryStatus::Skipped, StoryStatus::NotEstimated)
    }

    fn transition(&mut self, from: StoryStatus, to: StoryStatus) -> Result<(), DomainError> {
        if self.status != from {
            return Err(DomainError::InvalidTransition {
                from: self.status.as_str(),
                to: to.as_str(),
            });
        }
        self.set_status(to);
        Ok(())
    }

    fn set_status(&mut self, status: StoryStatus) {
        self.status = status;
        self.updated_at = current_timestamp();
    }
}

/// Role claim carried by an authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Moderator,
    Participant,
    Observer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Moderator => "MODERATOR",
            Role::Participant => "PARTICIPANT",
            Role::Observer => "OBSERVER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        match normalized.trim_start_matches("ROLE_") {
            "MODERATOR" => Ok(Role::Moderator),
            "PARTICIPANT" => Ok(Role::Participant),
            "OBSERVER" => Ok(Role::Observer),
            _ => Err(format!(
                "Invalid role: {}. Valid roles are: MODERATOR, PARTICIPANT, OBSERVER",
                s
            )),
        }
    }
}

/// Fields for a user the store has not assigned an id to yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub session_code: SessionCode,
    pub name: String,
    pub is_moderator: bool,
    pub is_observer: bool,
}

impl NewUser {
    pub fn new(
        session_code: SessionCode,
        name: impl Into<String>,
        is_moderator: bool,
        is_observer: bool,
    ) -> Result<Self, DomainError> {
        let name = validate_name(name.into())?;
        Ok(Self {
            session_code,
            name,
            is_moderator,
            is_observer,
        })
    }
}

/// Validate a participant display name (1..=50 characters after trimming)
pub fn validate_name(name: String) -> Result<String, DomainError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(DomainError::InvalidName(format!(
            "name must be between 1 and {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// A participant in exactly one session (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub session_code: SessionCode,
    pub name: String,
    pub is_moderator: bool,
    pub is_observer: bool,
    pub is_active: bool,
    pub joined_at: u64,
}

impl User {
    pub fn from_new(id: UserId, new: NewUser) -> Self {
        Self {
            id,
            session_code: new.session_code,
            name: new.name,
            is_moderator: new.is_moderator,
            is_observer: new.is_observer,
            is_active: true,
            joined_at: current_timestamp(),
        }
    }

    pub fn belongs_to(&self, code: &SessionCode) -> bool {
        &self.session_code == code
    }

    /// Active and not an observer
    pub fn is_eligible_voter(&self) -> bool {
        self.is_active && !self.is_observer
    }

    pub fn role(&self) -> Role {
        if self.is_moderator {
            Role::Moderator
        } else if self.is_observer {
            Role::Observer
        } else {
            Role::Participant
        }
    }
}

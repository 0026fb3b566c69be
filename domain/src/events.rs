//! Session events broadcast to subscribers after a committed transition.

use crate::core::ids::{SessionCode, StoryId, UserId};
use crate::session::entities::Story;
use serde::{Deserialize, Serialize};

/// Subscriber topic; each session has one of each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Users,
    Votes,
    Reveal,
    Story,
    Timer,
}

impl Topic {
    pub fn segment(&self) -> &'static str {
        match self {
            Topic::Users => "users",
            Topic::Votes => "votes",
            Topic::Reveal => "reveal",
            Topic::Story => "story",
            Topic::Timer => "timer",
        }
    }

    /// Destination path for a session, e.g. `/topic/session/ABC123/votes`
    pub fn destination(&self, session: &SessionCode) -> String {
        format!("/topic/session/{}/{}", session, self.segment())
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segment())
    }
}

/// A state transition worth telling subscribers about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEvent {
    StoryActivated { story: Story },
    VoteCast { story_id: StoryId, count: usize },
    VotesRevealed { story_id: StoryId },
    VotesReset { story_id: StoryId },
    StoryFinalized { story: Story },
    StoryReset { story: Story },
    UserJoined { user_id: UserId, name: String },
    UserLeft { user_id: UserId, name: String },
    TimerSettingsChanged { enabled: bool, duration_seconds: u32 },
}

impl SessionEvent {
    pub fn topic(&self) -> Topic {
        match self {
            SessionEvent::UserJoined { .. } | SessionEvent::UserLeft { .. } => Topic::Users,
            SessionEvent::VoteCast { .. } => Topic::Votes,
            SessionEvent::VotesRevealed { .. } | SessionEvent::VotesReset { .. } => Topic::Reveal,
            SessionEvent::StoryActivated { .. }
            | SessionEvent::StoryFinalized { .. }
            | SessionEvent::StoryReset { .. } => Topic::Story,
            SessionEvent::TimerSettingsChanged { .. } => Topic::Timer,
        }
    }

    /// Wire name, matching the serialized `type` tag
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::StoryActivated { .. } => "STORY_ACTIVATED",
            SessionEvent::VoteCast { .. } => "VOTE_CAST",
            SessionEvent::VotesRevealed { .. } => "VOTES_REVEALED",
            SessionEvent::VotesReset { .. } => "VOTES_RESET",
            SessionEvent::StoryFinalized { .. } => "STORY_FINALIZED",
            SessionEvent::StoryReset { .. } => "STORY_RESET",
            SessionEvent::UserJoined { .. } => "USER_JOINED",
            SessionEvent::UserLeft { .. } => "USER_LEFT",
            SessionEvent::TimerSettingsChanged { .. } => "TIMER_SETTINGS_CHANGED",
        }
    }
}

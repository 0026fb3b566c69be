//! Voting round state
//!
//! Legacy storage shapes describe a round with two flags, `current_story_id`
//! and `votes_revealed`. Inside the domain the round is one tagged value so a
//! reveal without a current story cannot be represented. The flags are only
//! produced (and accepted) at the storage boundary, where a session is
//! serialized, via [`RoundState::flags`] and [`RoundState::from_flags`].

use crate::core::error::DomainError;
use crate::core::ids::StoryId;

/// Round state of a session
///
/// ```text
///            activate(s)               reveal
///   Idle ───────────────▶ Voting(s) ──────────▶ Revealed(s)
///                           ▲   ▲                  │
///                           │   └──── reset ───────┘
///                           └── activate(t) from any state
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundState {
    /// No story selected
    #[default]
    Idle,
    /// A story is selected and ballots are hidden
    Voting { story_id: StoryId },
    /// Ballots for the selected story are visible
    Revealed { story_id: StoryId },
}

impl RoundState {
    /// Rebuild a round from the legacy two-flag shape.
    pub fn from_flags(
        current_story_id: Option<StoryId>,
        votes_revealed: bool,
    ) -> Result<Self, DomainError> {
        match (current_story_id, votes_revealed) {
            (None, false) => Ok(RoundState::Idle),
            (None, true) => Err(DomainError::InvalidSettings(
                "votes cannot be revealed without a current story".to_string(),
            )),
            (Some(story_id), false) => Ok(RoundState::Voting { story_id }),
            (Some(story_id), true) => Ok(RoundState::Revealed { story_id }),
        }
    }

    /// Legacy `(current_story_id, votes_revealed)` view of this round.
    pub fn flags(&self) -> (Option<StoryId>, bool) {
        (self.current_story_id(), self.votes_revealed())
    }

    pub fn current_story_id(&self) -> Option<StoryId> {
        match self {
            RoundState::Idle => None,
            RoundState::Voting { story_id } | RoundState::Revealed { story_id } => Some(*story_id),
        }
    }

    pub fn votes_revealed(&self) -> bool {
        matches!(self, RoundState::Revealed { .. })
    }

    /// Whether `story_id` is the current story
    pub fn is_current(&self, story_id: StoryId) -> bool {
        self.current_story_id() == Some(story_id)
    }

    /// Whether ballots for `story_id` are currently visible
    pub fn is_revealed(&self, story_id: StoryId) -> bool {
        matches!(self, RoundState::Revealed { story_id: s } if *s == story_id)
    }

    /// Whether `story_id` is current and still hidden
    pub fn is_voting_on(&self, story_id: StoryId) -> bool {
        matches!(self, RoundState::Voting { story_id: s } if *s == story_id)
    }

    /// Select a story for voting. Always allowed; hides ballots.
    pub fn activate(story_id: StoryId) -> Self {
        RoundState::Voting { story_id }
    }

    /// Reveal the current story. Revealing twice is a no-op.
    ///
    /// Returns `None` when there is no current story.
    pub fn reveal(self) -> Option<Self> {
        self.current_story_id()
            .map(|story_id| RoundState::Revealed { story_id })
    }

    /// Hide ballots for the current story, keeping it selected.
    ///
    /// Returns `None` when there is no current story.
    pub fn hide(self) -> Option<Self> {
        self.current_story_id()
            .map(|story_id| RoundState::Voting { story_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: u64) -> StoryId {
        StoryId::new(id)
    }

    #[test]
    fn test_idle_has_no_flags() {
        let round = RoundState::Idle;
        assert_eq!(round.flags(), (None, false));
        assert!(round.reveal().is_none());
        assert!(round.hide().is_none());
    }

    #[test]
    fn test_activate_then_reveal() {
        let round = RoundState::activate(story(7));
        assert!(round.is_voting_on(story(7)));
        assert!(!round.votes_revealed());

        let revealed = round.reveal().unwrap();
        assert!(revealed.is_revealed(story(7)));
        assert!(!revealed.is_revealed(story(8)));
        assert_eq!(revealed.flags(), (Some(story(7)), true));
    }

    #[test]
    fn test_reveal_is_idempotent() {
        let revealed = RoundState::activate(story(1)).reveal().unwrap();
        assert_eq!(revealed.reveal(), Some(revealed));
    }

    #[test]
    fn test_hide_keeps_story_selected() {
        let hidden = RoundState::activate(story(3)).reveal().unwrap().hide().unwrap();
        assert_eq!(hidden, RoundState::Voting { story_id: story(3) });
    }

    #[test]
    fn test_from_flags_rejects_reveal_without_story() {
        assert!(RoundState::from_flags(None, true).is_err());
        assert_eq!(
            RoundState::from_flags(Some(story(2)), true).unwrap(),
            RoundState::Revealed { story_id: story(2) }
        );
    }
}

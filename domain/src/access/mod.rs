//! Access guard
//!
//! Stateless predicates applied before any round mutation. They look only at
//! already-loaded entities and the caller's verified claim; they never touch
//! storage or the notifier.

use crate::core::ids::{SessionCode, UserId};
use crate::session::entities::{Role, Story, User};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Verified identity of the caller, as issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    pub session_code: SessionCode,
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn new(session_code: SessionCode, user_id: UserId, role: Role) -> Self {
        Self {
            session_code,
            user_id,
            role,
        }
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

/// Rejections raised by the access guard
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("{entity} {id} does not belong to session {session}")]
    SessionMembership {
        entity: &'static str,
        id: String,
        session: SessionCode,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// The story must belong to the claimed session
pub fn require_story_in_session(story: &Story, session: &SessionCode) -> Result<(), AccessError> {
    if !story.belongs_to(session) {
        return Err(AccessError::SessionMembership {
            entity: "Story",
            id: story.id.to_string(),
            session: session.clone(),
        });
    }
    Ok(())
}

/// The user must belong to the claimed session
pub fn require_user_in_session(user: &User, session: &SessionCode) -> Result<(), AccessError> {
    if !user.belongs_to(session) {
        return Err(AccessError::SessionMembership {
            entity: "User",
            id: user.id.to_string(),
            session: session.clone(),
        });
    }
    Ok(())
}

/// The caller's claim must be for this session
pub fn require_caller_in_session(caller: &Caller, session: &SessionCode) -> Result<(), AccessError> {
    if &caller.session_code != session {
        return Err(AccessError::SessionMembership {
            entity: "Caller",
            id: caller.user_id.to_string(),
            session: session.clone(),
        });
    }
    Ok(())
}

/// Moderator-only operations
pub fn require_moderator(caller: &Caller) -> Result<(), AccessError> {
    if !caller.is_moderator() {
        return Err(AccessError::Forbidden(format!(
            "moderator role required, caller {} is {}",
            caller.user_id, caller.role
        )));
    }
    Ok(())
}

/// Operations on a user's own resources (ballot withdrawal, leaving)
pub fn require_self_or_moderator(caller: &Caller, target: UserId) -> Result<(), AccessError> {
    if caller.is_moderator() || caller.user_id == target {
        return Ok(());
    }
    Err(AccessError::Forbidden(format!(
        "caller {} may not act on behalf of user {}",
        caller.user_id, target
    )))
}

/// Operations only the user themself may perform (casting a ballot)
pub fn require_self(caller: &Caller, target: UserId) -> Result<(), AccessError> {
    if caller.user_id != target {
        return Err(AccessError::Forbidden(format!(
            "caller {} may not vote as user {}",
            caller.user_id, target
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::StoryId;
    use crate::session::entities::{NewStory, NewUser};

    fn code(s: &str) -> SessionCode {
        SessionCode::parse(s).unwrap()
    }

    fn caller(role: Role, id: u64) -> Caller {
        Caller::new(code("AAAAAA"), UserId::new(id), role)
    }

    #[test]
    fn test_story_membership() {
        let story = Story::from_new(
            StoryId::new(1),
            0,
            NewStory::new(code("AAAAAA"), "Story", None).unwrap(),
        );
        assert!(require_story_in_session(&story, &code("AAAAAA")).is_ok());

        let err = require_story_in_session(&story, &code("BBBBBB")).unwrap_err();
        assert_eq!(err.to_string(), "Story 1 does not belong to session BBBBBB");
    }

    #[test]
    fn test_user_membership() {
        let user = User::from_new(
            UserId::new(5),
            NewUser::new(code("AAAAAA"), "Grace", false, false).unwrap(),
        );
        assert!(require_user_in_session(&user, &code("AAAAAA")).is_ok());
        assert!(matches!(
            require_user_in_session(&user, &code("CCCCCC")),
            Err(AccessError::SessionMembership { entity: "User", .. })
        ));
    }

    #[test]
    fn test_caller_membership() {
        let c = caller(Role::Moderator, 1);
        assert!(require_caller_in_session(&c, &code("AAAAAA")).is_ok());
        assert!(require_caller_in_session(&c, &code("ZZZZZZ")).is_err());
    }

    #[test]
    fn test_moderator_required() {
        assert!(require_moderator(&caller(Role::Moderator, 1)).is_ok());
        assert!(matches!(
            require_moderator(&caller(Role::Participant, 2)),
            Err(AccessError::Forbidden(_))
        ));
        assert!(require_moderator(&caller(Role::Observer, 3)).is_err());
    }

    #[test]
    fn test_self_or_moderator() {
        let participant = caller(Role::Participant, 2);
        assert!(require_self_or_moderator(&participant, UserId::new(2)).is_ok());
        assert!(require_self_or_moderator(&participant, UserId::new(3)).is_err());
        assert!(require_self_or_moderator(&caller(Role::Moderator, 1), UserId::new(3)).is_ok());
    }

    #[test]
    fn test_self_only() {
        assert!(require_self(&caller(Role::Moderator, 1), UserId::new(2)).is_err());
        assert!(require_self(&caller(Role::Participant, 2), UserId::new(2)).is_ok());
    }
}

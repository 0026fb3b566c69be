//! Event notifier port
//!
//! Fire-and-forget delivery of session events to subscribers. Publishing
//! happens after the triggering transition has committed; a failed delivery
//! is logged by the caller and dropped, never retried.

use poker_domain::{SessionCode, SessionEvent};
use thiserror::Error;

/// Errors reported by a notifier
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Channel closed: {0}")]
    Closed(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Broadcasts session events on the event's topic
///
/// Implementations live in the infrastructure layer (broadcast channels,
/// JSONL event log, ...).
pub trait EventNotifier: Send + Sync {
    /// Publish one event to the subscribers of `session`
    fn publish(&self, session: &SessionCode, event: &SessionEvent) -> Result<(), NotifyError>;

    /// Release whatever is held for a closed session
    fn close(&self, _session: &SessionCode) {}
}

/// No-op notifier for when nobody is listening
pub struct NoNotifier;

impl EventNotifier for NoNotifier {
    fn publish(&self, _session: &SessionCode, _event: &SessionEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}

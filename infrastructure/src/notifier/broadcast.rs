//! Broadcast notifier
//!
//! One `tokio::sync::broadcast` channel per session code. Subscribers receive
//! an [`EventEnvelope`] carrying the topic destination alongside the event.

use dashmap::DashMap;
use poker_application::ports::notifier::{EventNotifier, NotifyError};
use poker_domain::{SessionCode, SessionEvent, Topic};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// An event addressed to one session topic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventEnvelope {
    pub session_code: SessionCode,
    pub topic: Topic,
    /// e.g. `/topic/session/ABC123/votes`
    pub destination: String,
    pub event: SessionEvent,
}

impl EventEnvelope {
    pub fn new(session_code: &SessionCode, event: &SessionEvent) -> Self {
        let topic = event.topic();
        Self {
            session_code: session_code.clone(),
            topic,
            destination: topic.destination(session_code),
            event: event.clone(),
        }
    }
}

/// Notifier publishing to in-process broadcast channels
pub struct BroadcastNotifier {
    channels: DashMap<SessionCode, broadcast::Sender<EventEnvelope>>,
    capacity: usize,
}

impl BroadcastNotifier {
    /// `capacity` is the per-session backlog a slow subscriber may fall
    /// behind by before it starts missing events.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Receive every event published for `session` from now on
    pub fn subscribe(&self, session: &SessionCode) -> broadcast::Receiver<EventEnvelope> {
        self.sender(session).subscribe()
    }

    pub fn subscriber_count(&self, session: &SessionCode) -> usize {
        self.channels
            .get(session)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    fn sender(&self, session: &SessionCode) -> broadcast::Sender<EventEnvelope> {
        self.channels
            .entry(session.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl EventNotifier for BroadcastNotifier {
    fn publish(&self, session: &SessionCode, event: &SessionEvent) -> Result<(), NotifyError> {
        let envelope = EventEnvelope::new(session, event);
        let destination = envelope.destination.clone();

        match self.sender(session).send(envelope) {
            Ok(receivers) => trace!("{} -> {} ({} receivers)", event.name(), destination, receivers),
            // Nobody listening is not a delivery failure
            Err(_) => trace!("{} -> {} (no receivers)", event.name(), destination),
        }
        Ok(())
    }

    /// Drop the channel of a closed session; its subscribers see the stream end
    fn close(&self, session: &SessionCode) {
        if self.channels.remove(session).is_some() {
            trace!("Closed channel for session {}", session);
        }
    }
}

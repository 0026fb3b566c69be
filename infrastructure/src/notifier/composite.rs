//! Composite notifier delegating to multiple notifiers.
//!
//! Used to fan session events out to subscribers and the JSONL event log at
//! the same time.

use poker_application::ports::notifier::{EventNotifier, NotifyError};
use poker_domain::{SessionCode, SessionEvent};
use std::sync::Arc;

/// A notifier that publishes every event to all of its delegates.
///
/// Every delegate is attempted even when an earlier one fails; the first
/// failure is reported.
#[derive(Default)]
pub struct CompositeNotifier {
    delegates: Vec<Arc<dyn EventNotifier>>,
}

impl CompositeNotifier {
    pub fn new(delegates: Vec<Arc<dyn EventNotifier>>) -> Self {
        Self { delegates }
    }

    pub fn with(mut self, delegate: Arc<dyn EventNotifier>) -> Self {
        self.delegates.push(delegate);
        self
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl EventNotifier for CompositeNotifier {
    fn publish(&self, session: &SessionCode, event: &SessionEvent) -> Result<(), NotifyError> {
        let mut first_error = None;
        for delegate in &self.delegates {
            if let Err(e) = delegate.publish(session, event) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn close(&self, session: &SessionCode) {
        for delegate in &self.delegates {
            delegate.close(session);
        }
    }
}

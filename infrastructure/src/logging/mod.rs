//! Logging infrastructure: structured session event logging.
//!
//! Provides [`JsonlEventLog`], a JSONL file writer that implements the
//! [`EventNotifier`](poker_application::EventNotifier) port.

mod jsonl_event_log;

pub use jsonl_event_log::JsonlEventLog;

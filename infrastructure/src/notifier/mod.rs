//! Event notifier adapters
//!
//! - [`BroadcastNotifier`]: per-session `tokio::sync::broadcast` channels
//! - [`CompositeNotifier`]: fan-out to several notifiers

mod broadcast;
mod composite;

pub use broadcast::{BroadcastNotifier, EventEnvelope};
pub use composite::CompositeNotifier;

//! Infrastructure layer for planning-poker
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod identity;
pub mod logging;
pub mod notifier;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigSource, ConfigValidationError, FileConfig, FileLoggingConfig,
    FileNotifierConfig, FileRoundConfig, FileSessionConfig,
};
pub use identity::TokenIdentityProvider;
pub use logging::JsonlEventLog;
pub use notifier::{BroadcastNotifier, CompositeNotifier, EventEnvelope};
pub use store::InMemoryStore;

//! Session domain: sessions, stories, participants and their settings.

pub mod entities;
pub mod settings;
pub mod sizing;

pub use entities::{NewStory, NewUser, Role, Session, Story, StoryStatus, User};
pub use settings::{SessionSettings, SettingsChange, SettingsPatch};
pub use sizing::SizingMethod;

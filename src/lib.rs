//! Questline
//!
//! Client-side engine of a personal quest tracker: quest-lines hold quests,
//! quests hold subtasks, and completion is derived from the subtasks.
//! The signed-in user's data is mirrored live from a per-user document
//! store, mutations are written back as whole documents, and deadlines
//! turn into local reminders.
//!
//! Entry point is [`QuestApp::start`]; read state through
//! [`SyncEngine::subscribe`] and mutate through the `SyncEngine` commands.

pub mod auth;
mod commands;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod reminder;
pub mod repository;
pub mod session;
pub mod store;
pub mod sync;
pub mod tree;

#[cfg(test)]
mod testkit;

pub use auth::{IdentityProvider, User};
pub use config::AppConfig;
pub use context::QuestApp;
pub use domain::{NewQuest, NewQuestLine, NewSubtask, Quest, QuestEdit, QuestLine, Subtask};
pub use error::{AppError, AuthError, ConfigError, NotifyError, StoreError};
pub use reminder::{Clock, NotificationScheduler, ReminderId, ReminderPolicy, SystemClock};
pub use repository::{DocumentStore, MemoryStore};
pub use session::{SessionBinding, SessionState};
pub use store::QuestState;
pub use sync::SyncEngine;

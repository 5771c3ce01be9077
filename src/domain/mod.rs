//! Domain Layer
//!
//! The QuestLine → Quest → Subtask tree, completion derivation, and the
//! entity traits shared by the sync engine.
//! This layer has NO async or I/O dependencies.

mod completion;
mod entity;
mod quest;
mod quest_line;
mod subtask;

pub use completion::{derive_completion, CompletionTransition};
pub use entity::{find_by_id, new_id, Document, Entity};
pub use quest::{NewQuest, Quest, QuestEdit};
pub use quest_line::{NewQuestLine, QuestLine};
pub use subtask::{NewSubtask, Subtask};

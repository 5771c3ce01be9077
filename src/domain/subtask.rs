//! Subtask Entity
//!
//! Leaf work item. Lives only inside a quest's `subtasks` list and has no
//! document of its own.

use serde::{Deserialize, Serialize};

use super::entity::{new_id, Entity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub is_completed: bool,
}

/// Fields supplied by the user when adding a subtask
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSubtask {
    pub title: String,
    pub description: String,
    pub is_optional: bool,
}

impl Subtask {
    pub fn new(input: NewSubtask) -> Self {
        Self {
            id: new_id(),
            title: input.title,
            description: input.description,
            is_optional: input.is_optional,
            is_completed: false,
        }
    }

    /// Copy with the completion flag flipped
    pub fn toggled(&self) -> Self {
        Self {
            is_completed: !self.is_completed,
            ..self.clone()
        }
    }

    pub fn with_completed(&self, is_completed: bool) -> Self {
        Self {
            is_completed,
            ..self.clone()
        }
    }
}

impl Entity for Subtask {
    fn id(&self) -> &str {
        &self.id
    }
}

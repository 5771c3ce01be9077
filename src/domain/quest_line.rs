//! Quest-Line Entity
//!
//! Top-level grouping of quests. Deleting one deletes every quest that
//! references it.

use serde::{Deserialize, Serialize};

use super::entity::{new_id, Document, Entity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestLine {
    #[serde(default)]
    id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Fields supplied by the user when adding a quest-line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewQuestLine {
    pub title: String,
    pub description: String,
}

impl QuestLine {
    pub fn new(input: NewQuestLine) -> Self {
        Self {
            id: new_id(),
            title: input.title,
            description: input.description,
        }
    }

    /// Copy with new title and description, same id
    pub fn with_details(&self, title: String, description: String) -> Self {
        Self {
            id: self.id.clone(),
            title,
            description,
        }
    }
}

impl Entity for QuestLine {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for QuestLine {
    const COLLECTION: &'static str = "questLines";

    fn with_document_id(self, id: String) -> Self {
        Self { id, ..self }
    }
}

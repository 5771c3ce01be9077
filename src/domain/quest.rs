//! Quest Entity
//!
//! A quest belongs to one quest-line and embeds its subtasks; the quest
//! document is the unit of persistence. Every change produces a new value
//! bound to the same id, and every change to the subtask list re-derives
//! `is_completed`.
//!
//! Decoding is lenient about fields other clients write loosely: a
//! `deadline` without an offset is read as UTC and an unreadable one is
//! dropped, so the quest itself always stays visible.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::completion::derive_completion;
use super::entity::{new_id, Document, Entity};
use super::subtask::Subtask;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "QuestDocument")]
pub struct Quest {
    id: String,
    pub title: String,
    pub description: String,
    /// Foreign key into the quest-lines collection
    pub quest_line_id: String,
    pub is_optional: bool,
    pub deadline: Option<DateTime<Utc>>,
    subtasks: Vec<Subtask>,
    is_completed: bool,
}

/// Stored shape of a quest, including legacy field names
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestDocument {
    #[serde(default)]
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    quest_line_id: String,
    #[serde(default)]
    is_optional: Option<bool>,
    // Older documents flag main quests instead of optional ones.
    #[serde(default)]
    is_main_quest: Option<bool>,
    #[serde(default)]
    deadline: Option<Value>,
    // Older documents call the list `tasks`.
    #[serde(default, alias = "tasks")]
    subtasks: Vec<Subtask>,
    #[serde(default)]
    is_completed: bool,
}

impl From<QuestDocument> for Quest {
    fn from(doc: QuestDocument) -> Self {
        let is_optional = doc
            .is_optional
            .or(doc.is_main_quest.map(|main| !main))
            .unwrap_or(false);
        Self {
            id: doc.id,
            title: doc.title,
            description: doc.description,
            quest_line_id: doc.quest_line_id,
            is_optional,
            deadline: doc.deadline.as_ref().and_then(parse_deadline),
            subtasks: doc.subtasks,
            is_completed: doc.is_completed,
        }
    }
}

/// Read a stored deadline: RFC 3339, or a local date-time taken as UTC.
/// Anything else is logged and treated as no deadline.
pub fn parse_deadline(value: &Value) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Value::Null => return None,
        Value::String(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|deadline| deadline.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
                    .iter()
                    .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                    .map(|naive| naive.and_utc())
            }),
        _ => None,
    };
    if parsed.is_none() {
        tracing::warn!(deadline = %value, "ignoring unreadable deadline");
    }
    parsed
}

/// Fields supplied by the user when adding a quest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewQuest {
    pub title: String,
    pub description: String,
    pub quest_line_id: String,
    pub is_optional: bool,
    pub deadline: Option<DateTime<Utc>>,
}

/// Editable quest details (deadline has its own operation)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestEdit {
    pub title: String,
    pub description: String,
    pub is_optional: bool,
}

impl Quest {
    /// A fresh quest has no subtasks and is therefore not completed
    pub fn new(input: NewQuest) -> Self {
        Self {
            id: new_id(),
            title: input.title,
            description: input.description,
            quest_line_id: input.quest_line_id,
            is_optional: input.is_optional,
            deadline: input.deadline,
            subtasks: Vec::new(),
            is_completed: false,
        }
    }

    pub fn subtasks(&self) -> &[Subtask] {
        &self.subtasks
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn belongs_to(&self, quest_line_id: &str) -> bool {
        self.quest_line_id == quest_line_id
    }

    // ========================
    // Copy-with-modification
    // ========================

    /// Replace the subtask list and re-derive completion
    pub fn with_subtasks(&self, subtasks: Vec<Subtask>) -> Self {
        Self {
            is_completed: derive_completion(&subtasks),
            subtasks,
            ..self.clone()
        }
    }

    pub fn with_subtask_added(&self, subtask: Subtask) -> Self {
        let mut subtasks = self.subtasks.clone();
        subtasks.push(subtask);
        self.with_subtasks(subtasks)
    }

    /// `None` when no subtask has that id
    pub fn with_subtask_toggled(&self, subtask_id: &str) -> Option<Self> {
        if !self.subtasks.iter().any(|s| s.id == subtask_id) {
            return None;
        }
        let subtasks = self
            .subtasks
            .iter()
            .map(|s| if s.id == subtask_id { s.toggled() } else { s.clone() })
            .collect();
        Some(self.with_subtasks(subtasks))
    }

    /// `None` when no subtask has that id
    pub fn with_subtask_removed(&self, subtask_id: &str) -> Option<Self> {
        if !self.subtasks.iter().any(|s| s.id == subtask_id) {
            return None;
        }
        let subtasks = self
            .subtasks
            .iter()
            .filter(|s| s.id != subtask_id)
            .cloned()
            .collect();
        Some(self.with_subtasks(subtasks))
    }

    /// Quest-level toggle expressed through the subtasks.
    ///
    /// A completed quest has every subtask reopened. Otherwise the subtasks
    /// that decide completion are marked done: the required ones, or all of
    /// them when none are required. `None` for a quest without subtasks,
    /// which can never be completed.
    pub fn with_completion_toggled(&self) -> Option<Self> {
        if self.subtasks.is_empty() {
            return None;
        }

        let has_required = self.subtasks.iter().any(|s| !s.is_optional);
        let subtasks = if self.is_completed {
            self.subtasks.iter().map(|s| s.with_completed(false)).collect()
        } else {
            self.subtasks
                .iter()
                .map(|s| {
                    if !has_required || !s.is_optional {
                        s.with_completed(true)
                    } else {
                        s.clone()
                    }
                })
                .collect()
        };
        Some(self.with_subtasks(subtasks))
    }

    pub fn with_details(&self, edit: QuestEdit) -> Self {
        Self {
            title: edit.title,
            description: edit.description,
            is_optional: edit.is_optional,
            ..self.clone()
        }
    }

    pub fn with_deadline(&self, deadline: Option<DateTime<Utc>>) -> Self {
        Self {
            deadline,
            ..self.clone()
        }
    }
}

impl Entity for Quest {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Quest {
    const COLLECTION: &'static str = "quests";

    fn with_document_id(self, id: String) -> Self {
        Self { id, ..self }
    }
}

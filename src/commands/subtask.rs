//! Subtask Commands
//!
//! Subtasks live inside their quest, so each of these rewrites the whole
//! quest document.

use super::has_text;
use crate::domain::{Entity, NewSubtask, Subtask};
use crate::sync::SyncEngine;

impl SyncEngine {
    /// Append a subtask; a new required subtask reopens a completed quest
    pub async fn add_subtask(&self, quest_id: &str, input: NewSubtask) -> Option<String> {
        let uid = self.require_uid("add_subtask")?;
        if !has_text(&input.title) {
            return None;
        }
        let Some(quest) = self.state().find_quest(quest_id) else {
            tracing::debug!(quest_id, "quest not found");
            return None;
        };

        let subtask = Subtask::new(input);
        let subtask_id = subtask.id().to_string();
        let next = quest.with_subtask_added(subtask);
        if !self.commit_quest(&uid, &quest, &next).await {
            return None;
        }
        Some(subtask_id)
    }

    /// Flip one subtask; completing the quest this way cancels its reminder
    pub async fn toggle_subtask(&self, quest_id: &str, subtask_id: &str) -> bool {
        let Some(uid) = self.require_uid("toggle_subtask") else {
            return false;
        };
        let Some(quest) = self.state().find_quest(quest_id) else {
            tracing::debug!(quest_id, "quest not found");
            return false;
        };
        let Some(next) = quest.with_subtask_toggled(subtask_id) else {
            tracing::debug!(quest_id, subtask_id, "subtask not found");
            return false;
        };

        self.commit_quest(&uid, &quest, &next).await
    }

    pub async fn delete_subtask(&self, quest_id: &str, subtask_id: &str) -> bool {
        let Some(uid) = self.require_uid("delete_subtask") else {
            return false;
        };
        let Some(quest) = self.state().find_quest(quest_id) else {
            tracing::debug!(quest_id, "quest not found");
            return false;
        };
        let Some(next) = quest.with_subtask_removed(subtask_id) else {
            tracing::debug!(quest_id, subtask_id, "subtask not found");
            return false;
        };

        self.commit_quest(&uid, &quest, &next).await
    }
}

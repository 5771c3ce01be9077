//! Quest Commands

use chrono::{DateTime, Utc};

use super::has_text;
use crate::domain::{Entity, NewQuest, Quest, QuestEdit};
use crate::sync::SyncEngine;

impl SyncEngine {
    /// Create a quest under a quest-line and schedule its deadline reminder
    pub async fn add_quest(&self, input: NewQuest) -> Option<String> {
        let uid = self.require_uid("add_quest")?;
        if !has_text(&input.title) || !has_text(&input.quest_line_id) {
            tracing::debug!("quest title or quest-line is blank, skipping");
            return None;
        }

        let quest = Quest::new(input);
        if !self.write(&uid, &quest).await {
            return None;
        }
        tracing::info!(quest_id = quest.id(), quest_line_id = %quest.quest_line_id, "quest added");
        self.reminders().schedule_for(&quest).await;
        Some(quest.id().to_string())
    }

    pub async fn update_quest(&self, id: &str, edit: QuestEdit) -> bool {
        let Some(uid) = self.require_uid("update_quest") else {
            return false;
        };
        if !has_text(&edit.title) {
            return false;
        }
        let Some(quest) = self.state().find_quest(id) else {
            tracing::debug!(quest_id = id, "quest not found");
            return false;
        };

        self.write(&uid, &quest.with_details(edit)).await
    }

    /// Change or clear the deadline; the reminder follows the new value
    pub async fn set_quest_deadline(&self, id: &str, deadline: Option<DateTime<Utc>>) -> bool {
        let Some(uid) = self.require_uid("set_quest_deadline") else {
            return false;
        };
        let Some(quest) = self.state().find_quest(id) else {
            tracing::debug!(quest_id = id, "quest not found");
            return false;
        };

        let next = quest.with_deadline(deadline);
        if !self.write(&uid, &next).await {
            return false;
        }
        match deadline {
            Some(_) => {
                self.reminders().reschedule_for(&next).await;
            }
            None => self.reminders().cancel_for(id).await,
        }
        true
    }

    /// Flip a quest's completion through its subtasks.
    ///
    /// Completing marks the deciding subtasks done; reopening clears all of
    /// them. A quest without subtasks cannot be completed and is left alone.
    pub async fn toggle_quest(&self, id: &str) -> bool {
        let Some(uid) = self.require_uid("toggle_quest") else {
            return false;
        };
        let Some(quest) = self.state().find_quest(id) else {
            tracing::debug!(quest_id = id, "quest not found");
            return false;
        };
        let Some(next) = quest.with_completion_toggled() else {
            tracing::debug!(quest_id = id, "quest has no subtasks, nothing to toggle");
            return false;
        };

        self.commit_quest(&uid, &quest, &next).await
    }

    pub async fn delete_quest(&self, id: &str) -> bool {
        let Some(uid) = self.require_uid("delete_quest") else {
            return false;
        };
        if self.state().find_quest(id).is_none() {
            tracing::debug!(quest_id = id, "quest not found");
            return false;
        }

        if !self.remove::<Quest>(&uid, id).await {
            return false;
        }
        self.reminders().cancel_for(id).await;
        tracing::info!(quest_id = id, "quest deleted");
        true
    }
}

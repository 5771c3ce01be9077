//! Quest-Line Commands

use super::has_text;
use crate::domain::{Entity, NewQuestLine, Quest, QuestLine};
use crate::sync::SyncEngine;

impl SyncEngine {
    /// Create a quest-line; returns its id once the write is accepted
    pub async fn add_quest_line(&self, input: NewQuestLine) -> Option<String> {
        let uid = self.require_uid("add_quest_line")?;
        if !has_text(&input.title) {
            tracing::debug!("quest-line title is blank, skipping");
            return None;
        }

        let line = QuestLine::new(input);
        if !self.write(&uid, &line).await {
            return None;
        }
        tracing::info!(quest_line_id = line.id(), "quest-line added");
        Some(line.id().to_string())
    }

    pub async fn update_quest_line(&self, id: &str, title: String, description: String) -> bool {
        let Some(uid) = self.require_uid("update_quest_line") else {
            return false;
        };
        if !has_text(&title) {
            return false;
        }
        let Some(line) = self.state().find_quest_line(id) else {
            tracing::debug!(quest_line_id = id, "quest-line not found");
            return false;
        };

        self.write(&uid, &line.with_details(title, description)).await
    }

    /// Delete a quest-line and, before it, every quest that references it.
    ///
    /// Children are deleted one at a time, each followed by cancelling its
    /// reminder. The first failed delete aborts the cascade: quests already
    /// removed stay removed and the line itself is kept.
    pub async fn delete_quest_line(&self, id: &str) -> bool {
        let Some(uid) = self.require_uid("delete_quest_line") else {
            return false;
        };
        if self.state().find_quest_line(id).is_none() {
            tracing::debug!(quest_line_id = id, "quest-line not found");
            return false;
        }

        let children = self.state().quests_in_line(id);
        for quest in &children {
            if !self.remove::<Quest>(&uid, quest.id()).await {
                tracing::error!(
                    quest_line_id = id,
                    quest_id = quest.id(),
                    "cascade interrupted, quest-line kept"
                );
                return false;
            }
            self.reminders().cancel_for(quest.id()).await;
        }

        if !self.remove::<QuestLine>(&uid, id).await {
            return false;
        }
        tracing::info!(quest_line_id = id, quests = children.len(), "quest-line deleted");
        true
    }
}

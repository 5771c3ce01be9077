//! Mutation Commands
//!
//! User-facing mutations on the sync engine, organized by entity.
//!
//! Every command reads its target from the current snapshot, writes the
//! next document, and leaves the mirror to the listeners. A command with no
//! bound user or no target is a no-op. Store failures are logged and
//! reported as `false`/`None`; they never panic and never touch the mirror.

mod quest;
mod quest_line;
mod subtask;


use crate::domain::{CompletionTransition, Entity, Quest};
use crate::sync::SyncEngine;

/// Non-blank after trimming
fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

impl SyncEngine {
    /// Bound uid, or `None` with a debug line naming the skipped command
    fn require_uid(&self, command: &'static str) -> Option<String> {
        let uid = self.current_uid();
        if uid.is_none() {
            tracing::debug!(command, "no user bound, skipping");
        }
        uid
    }

    /// Write the next version of a quest and react to its completion change
    async fn commit_quest(&self, uid: &str, before: &Quest, next: &Quest) -> bool {
        if !self.write(uid, next).await {
            return false;
        }
        let transition = CompletionTransition::between(before.is_completed(), next.is_completed());
        if transition != CompletionTransition::Unchanged {
            tracing::info!(quest_id = next.id(), ?transition, "quest completion changed");
        }
        self.reminders().on_transition(next.id(), transition).await;
        true
    }
}

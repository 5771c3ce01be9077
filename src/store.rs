//! Mirrored Application State
//!
//! Local reactive copy of the signed-in user's quest-lines and quests.
//! Consumers read it or subscribe to changes; only the sync engine writes.
//!
//! Every bound subscription set carries a generation number. A snapshot is
//! applied only if its generation is still current, and the check happens
//! under the same lock as the rebind, so events from a torn-down
//! subscription can never land in state that belongs to another identity.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;

use crate::domain::{find_by_id, Quest, QuestLine};

/// Snapshot of the mirrored collections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestState {
    /// User the collections belong to; `None` while unbound
    pub uid: Option<String>,
    pub quest_lines: Vec<QuestLine>,
    pub quests: Vec<Quest>,
    /// Bound but no quests snapshot received yet
    pub loading: bool,
}

impl QuestState {
    pub fn quest(&self, id: &str) -> Option<&Quest> {
        find_by_id(&self.quests, id)
    }

    pub fn quest_line(&self, id: &str) -> Option<&QuestLine> {
        find_by_id(&self.quest_lines, id)
    }

    /// Quests whose `quest_line_id` points at the given line
    pub fn quests_in_line<'a>(&'a self, quest_line_id: &'a str) -> impl Iterator<Item = &'a Quest> + 'a {
        self.quests.iter().filter(move |q| q.belongs_to(quest_line_id))
    }
}

/// Owner of the mirrored state
pub struct AppStore {
    state: watch::Sender<QuestState>,
    generation: Mutex<u64>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(QuestState::default());
        Self {
            state,
            generation: Mutex::new(0),
        }
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<QuestState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> QuestState {
        self.state.borrow().clone()
    }

    pub fn find_quest(&self, id: &str) -> Option<Quest> {
        self.state.borrow().quest(id).cloned()
    }

    pub fn find_quest_line(&self, id: &str) -> Option<QuestLine> {
        self.state.borrow().quest_line(id).cloned()
    }

    pub fn quests_in_line(&self, quest_line_id: &str) -> Vec<Quest> {
        self.state.borrow().quests_in_line(quest_line_id).cloned().collect()
    }

    pub fn bound_uid(&self) -> Option<String> {
        self.state.borrow().uid.clone()
    }

    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(|p| p.into_inner())
    }

    // ========================
    // Engine-side writes
    // ========================

    /// Start a new generation for `uid`; clears everything and marks loading
    pub(crate) fn begin_generation(&self, uid: &str) -> u64 {
        let mut generation = self.lock_generation();
        *generation += 1;
        self.state.send_replace(QuestState {
            uid: Some(uid.to_string()),
            loading: true,
            ..QuestState::default()
        });
        *generation
    }

    /// Invalidate the current generation and drop all mirrored data
    pub(crate) fn clear(&self) {
        let mut generation = self.lock_generation();
        *generation += 1;
        self.state.send_replace(QuestState::default());
    }

    #[cfg(test)]
    pub(crate) fn current_generation(&self) -> u64 {
        *self.lock_generation()
    }

    fn apply_if_current(&self, generation: u64, apply: impl FnOnce(&mut QuestState)) -> bool {
        let current = self.lock_generation();
        if *current != generation {
            return false;
        }
        self.state.send_modify(apply);
        true
    }

    /// Replace the quest-lines; `false` when the generation is stale
    pub(crate) fn replace_quest_lines(&self, generation: u64, quest_lines: Vec<QuestLine>) -> bool {
        self.apply_if_current(generation, |state| state.quest_lines = quest_lines)
    }

    /// Replace the quests and end loading; `false` when the generation is stale
    pub(crate) fn replace_quests(&self, generation: u64, quests: Vec<Quest>) -> bool {
        self.apply_if_current(generation, |state| {
            state.quests = quests;
            state.loading = false;
        })
    }

    pub(crate) fn stop_loading(&self, generation: u64) -> bool {
        self.apply_if_current(generation, |state| state.loading = false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entity, NewQuest, NewQuestLine};

    fn line(title: &str) -> QuestLine {
        QuestLine::new(NewQuestLine {
            title: title.to_string(),
            description: String::new(),
        })
    }

    fn quest_in(line: &QuestLine) -> Quest {
        Quest::new(NewQuest {
            title: "Quest".to_string(),
            quest_line_id: line.id().to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_begin_generation_marks_loading() {
        let store = AppStore::new();
        let generation = store.begin_generation("u1");

        let state = store.snapshot();
        assert!(state.loading);
        assert_eq!(state.uid.as_deref(), Some("u1"));
        assert_eq!(store.current_generation(), generation);
    }

    #[test]
    fn test_quests_snapshot_ends_loading() {
        let store = AppStore::new();
        let generation = store.begin_generation("u1");
        let chapter = line("Chapter 1");

        assert!(store.replace_quest_lines(generation, vec![chapter.clone()]));
        assert!(store.snapshot().loading);
        assert!(store.replace_quests(generation, vec![quest_in(&chapter)]));

        let state = store.snapshot();
        assert!(!state.loading);
        assert_eq!(state.quests_in_line(chapter.id()).count(), 1);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let store = AppStore::new();
        let old = store.begin_generation("alice");
        let new = store.begin_generation("bob");
        assert_ne!(old, new);

        assert!(!store.replace_quest_lines(old, vec![line("Alice's line")]));
        assert!(!store.replace_quests(old, Vec::new()));

        let state = store.snapshot();
        assert!(state.quest_lines.is_empty());
        assert!(state.loading);
        assert_eq!(state.uid.as_deref(), Some("bob"));
    }

    #[test]
    fn test_clear_invalidates_generation() {
        let store = AppStore::new();
        let generation = store.begin_generation("u1");
        store.replace_quest_lines(generation, vec![line("L")]);

        store.clear();

        assert_eq!(store.snapshot(), QuestState::default());
        assert!(!store.replace_quest_lines(generation, vec![line("late")]));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = AppStore::new();
        let mut rx = store.subscribe();
        let generation = store.begin_generation("u1");

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().loading);

        store.replace_quests(generation, Vec::new());
        rx.changed().await.unwrap();
        assert!(!rx.borrow().loading);
    }
}

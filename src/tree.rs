//! Tree Utilities
//!
//! Read-side views over the mirrored state: quests grouped under their
//! quest-line, and progress counts for lines, quests, and the profile.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{Entity, Quest, QuestLine};
use crate::store::QuestState;

/// A quest-line with its quests, in snapshot order
#[derive(Debug, Clone, PartialEq)]
pub struct QuestLineGroup<'a> {
    pub quest_line: &'a QuestLine,
    pub quests: Vec<&'a Quest>,
}

impl QuestLineGroup<'_> {
    pub fn progress(&self) -> QuestLineProgress {
        QuestLineProgress::of(self.quests.iter().copied())
    }
}

/// Group quests under their quest-line.
/// Returns the groups in quest-line order plus the quests whose
/// `quest_line_id` matches no quest-line.
pub fn group_by_quest_line(state: &QuestState) -> (Vec<QuestLineGroup<'_>>, Vec<&Quest>) {
    // Build line id -> quests map
    let mut by_line: HashMap<&str, Vec<&Quest>> = HashMap::new();
    for quest in &state.quests {
        by_line.entry(quest.quest_line_id.as_str()).or_default().push(quest);
    }

    let groups = state
        .quest_lines
        .iter()
        .map(|line| QuestLineGroup {
            quest_line: line,
            quests: by_line.remove(line.id()).unwrap_or_default(),
        })
        .collect();

    // Whatever is left points at a missing line
    let orphans = state
        .quests
        .iter()
        .filter(|q| by_line.contains_key(q.quest_line_id.as_str()))
        .collect();

    (groups, orphans)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuestLineProgress {
    pub completed: usize,
    pub total: usize,
}

impl QuestLineProgress {
    fn of<'a>(quests: impl Iterator<Item = &'a Quest>) -> Self {
        quests.fold(Self::default(), |acc, quest| Self {
            completed: acc.completed + usize::from(quest.is_completed()),
            total: acc.total + 1,
        })
    }
}

pub fn quest_line_progress(state: &QuestState, quest_line_id: &str) -> QuestLineProgress {
    QuestLineProgress::of(state.quests_in_line(quest_line_id))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubtaskProgress {
    pub completed: usize,
    pub total: usize,
    pub required: usize,
    pub completed_required: usize,
}

pub fn subtask_progress(quest: &Quest) -> SubtaskProgress {
    quest
        .subtasks()
        .iter()
        .fold(SubtaskProgress::default(), |mut acc, subtask| {
            acc.total += 1;
            if subtask.is_completed {
                acc.completed += 1;
            }
            if !subtask.is_optional {
                acc.required += 1;
                if subtask.is_completed {
                    acc.completed_required += 1;
                }
            }
            acc
        })
}

/// Totals shown on the profile page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProfileStats {
    pub quest_lines: usize,
    pub quests: usize,
    pub completed_quests: usize,
    pub subtasks: usize,
    pub completed_subtasks: usize,
}

pub fn profile_stats(state: &QuestState) -> ProfileStats {
    let mut stats = ProfileStats {
        quest_lines: state.quest_lines.len(),
        quests: state.quests.len(),
        ..ProfileStats::default()
    };
    for quest in &state.quests {
        if quest.is_completed() {
            stats.completed_quests += 1;
        }
        let progress = subtask_progress(quest);
        stats.subtasks += progress.total;
        stats.completed_subtasks += progress.completed;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewQuest, NewQuestLine, NewSubtask, Subtask};

    fn make_line(title: &str) -> QuestLine {
        QuestLine::new(NewQuestLine {
            title: title.to_string(),
            description: String::new(),
        })
    }

    fn make_quest(line_id: &str, subtasks: &[(bool, bool)]) -> Quest {
        let subtasks = subtasks
            .iter()
            .map(|&(optional, completed)| {
                Subtask::new(NewSubtask {
                    title: "Step".to_string(),
                    is_optional: optional,
                    ..Default::default()
                })
                .with_completed(completed)
            })
            .collect();
        Quest::new(NewQuest {
            title: "Quest".to_string(),
            quest_line_id: line_id.to_string(),
            ..Default::default()
        })
        .with_subtasks(subtasks)
    }

    fn make_state() -> QuestState {
        let main = make_line("Main story");
        let side = make_line("Side stories");
        let quests = vec![
            make_quest(main.id(), &[(false, true), (true, false)]),
            make_quest(main.id(), &[(false, false)]),
            make_quest(side.id(), &[]),
            make_quest("deleted-line", &[(false, true)]),
        ];
        QuestState {
            uid: Some("u1".to_string()),
            quest_lines: vec![main, side],
            quests,
            loading: false,
        }
    }

    #[test]
    fn test_group_by_quest_line() {
        let state = make_state();
        let (groups, orphans) = group_by_quest_line(&state);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].quest_line.title, "Main story");
        assert_eq!(groups[0].quests.len(), 2);
        assert_eq!(groups[1].quests.len(), 1);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].quest_line_id, "deleted-line");
    }

    #[test]
    fn test_empty_line_still_grouped() {
        let mut state = make_state();
        state.quest_lines.push(make_line("Epilogue"));

        let (groups, _) = group_by_quest_line(&state);
        assert_eq!(groups.len(), 3);
        assert!(groups[2].quests.is_empty());
        assert_eq!(groups[2].progress(), QuestLineProgress::default());
    }

    #[test]
    fn test_quest_line_progress() {
        let state = make_state();
        let main = state.quest_lines[0].id().to_string();

        let progress = quest_line_progress(&state, &main);
        assert_eq!(progress, QuestLineProgress { completed: 1, total: 2 });

        let (groups, _) = group_by_quest_line(&state);
        assert_eq!(groups[0].progress(), progress);
    }

    #[test]
    fn test_subtask_progress() {
        let quest = make_quest("l", &[(false, true), (false, false), (true, true)]);
        assert_eq!(
            subtask_progress(&quest),
            SubtaskProgress {
                completed: 2,
                total: 3,
                required: 2,
                completed_required: 1,
            }
        );
    }

    #[test]
    fn test_profile_stats() {
        let stats = profile_stats(&make_state());
        assert_eq!(
            stats,
            ProfileStats {
                quest_lines: 2,
                quests: 4,
                completed_quests: 2,
                subtasks: 4,
                completed_subtasks: 2,
            }
        );
    }
}

//! Completion Derivation
//!
//! A quest's completion is never stored independently: it is recomputed
//! from its subtasks on every mutation that touches them.
//!
//! Rules:
//! - with at least one required subtask, the quest is complete iff every
//!   required subtask is complete (optional ones are ignored);
//! - with only optional subtasks, every subtask must be complete;
//! - a quest without subtasks is never complete.

use super::subtask::Subtask;

/// Derive a quest's completion from its subtasks
pub fn derive_completion(subtasks: &[Subtask]) -> bool {
    if subtasks.is_empty() {
        return false;
    }

    let mut required = subtasks.iter().filter(|s| !s.is_optional).peekable();
    if required.peek().is_some() {
        required.all(|s| s.is_completed)
    } else {
        subtasks.iter().all(|s| s.is_completed)
    }
}

/// How a quest's completion moved across one mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionTransition {
    Completed,
    Reopened,
    Unchanged,
}

impl CompletionTransition {
    pub fn between(before: bool, after: bool) -> Self {
        match (before, after) {
            (false, true) => CompletionTransition::Completed,
            (true, false) => CompletionTransition::Reopened,
            _ => CompletionTransition::Unchanged,
        }
    }
}

//! Reminder Scheduler
//!
//! Maps a quest to a local one-shot alarm shortly before its deadline.
//!
//! The alarm id is derived from the quest id alone, so a reminder can be
//! cancelled without any stored mapping. Two quest ids may hash to the same
//! alarm id; that collision risk is accepted. A later schedule for the
//! colliding quest replaces the earlier alarm.
//!
//! Scheduler failures never fail the calling mutation: they are logged and
//! the reminder is skipped.

mod clock;
mod notifier;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::domain::{CompletionTransition, Entity, Quest};

pub use clock::{Clock, ManualClock, SystemClock};
pub use notifier::{Notification, NotificationScheduler, PermissionStatus};

/// Modulus of the id hash (2^31 - 1)
const ID_MODULUS: i64 = 2_147_483_647;

/// Stable alarm id of a quest, in `0..=2^31-2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReminderId(i32);

impl ReminderId {
    /// Polynomial rolling hash over the UTF-16 code units of the quest id
    pub fn for_quest(quest_id: &str) -> Self {
        let hash = quest_id
            .encode_utf16()
            .fold(0i64, |hash, unit| (hash * 31 + i64::from(unit)) % ID_MODULUS);
        // hash < ID_MODULUS <= i32::MAX
        Self(hash.abs() as i32)
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

/// Timing and wording of reminders
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderPolicy {
    /// How long before the deadline the alarm fires
    pub lead: Duration,
    /// Delay used when the lead time has already passed
    pub immediate_delay: Duration,
    pub title: String,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self {
            lead: Duration::hours(1),
            immediate_delay: Duration::seconds(5),
            title: "Quest deadline approaching".to_string(),
        }
    }
}

/// When the reminder for `deadline` should fire, if at all.
///
/// Nothing for a deadline that has passed. A lead time that has passed is
/// clamped to `now + immediate_delay` instead of being dropped. A lead that
/// reaches before the representable range counts as passed; an immediate
/// delay past the end of it plans nothing.
pub fn plan_fire_time(
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
    policy: &ReminderPolicy,
) -> Option<DateTime<Utc>> {
    if deadline <= now {
        return None;
    }
    match deadline.checked_sub_signed(policy.lead) {
        Some(notify_at) if notify_at > now => Some(notify_at),
        _ => now.checked_add_signed(policy.immediate_delay),
    }
}

/// Applies the reminder policy against the platform scheduler
#[derive(Clone)]
pub struct ReminderScheduler {
    notifier: Arc<dyn NotificationScheduler>,
    clock: Arc<dyn Clock>,
    policy: ReminderPolicy,
}

impl ReminderScheduler {
    pub fn new(
        notifier: Arc<dyn NotificationScheduler>,
        clock: Arc<dyn Clock>,
        policy: ReminderPolicy,
    ) -> Self {
        Self {
            notifier,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &ReminderPolicy {
        &self.policy
    }

    /// Schedule the deadline reminder for a quest.
    ///
    /// Returns the fire time when an alarm was scheduled. Completed quests,
    /// quests without a future deadline, and missing permission all skip.
    pub async fn schedule_for(&self, quest: &Quest) -> Option<DateTime<Utc>> {
        if quest.is_completed() {
            return None;
        }
        let deadline = quest.deadline?;
        let fire_at = plan_fire_time(deadline, self.clock.now(), &self.policy)?;

        match self.notifier.request_permissions().await {
            Ok(status) if status.granted => {}
            Ok(_) => {
                tracing::debug!(quest_id = quest.id(), "notification permission not granted");
                return None;
            }
            Err(e) => {
                tracing::warn!(quest_id = quest.id(), error = %e, "permission request failed");
                return None;
            }
        }

        let id = ReminderId::for_quest(quest.id());
        let notification = Notification {
            id,
            title: self.policy.title.clone(),
            body: quest.title.clone(),
            fire_at,
        };
        match self.notifier.schedule(notification).await {
            Ok(()) => {
                tracing::debug!(quest_id = quest.id(), reminder_id = id.value(), %fire_at, "reminder scheduled");
                Some(fire_at)
            }
            Err(e) => {
                tracing::warn!(quest_id = quest.id(), error = %e, "failed to schedule reminder");
                None
            }
        }
    }

    /// Cancel whatever reminder the quest id maps to
    pub async fn cancel_for(&self, quest_id: &str) {
        let id = ReminderId::for_quest(quest_id);
        if let Err(e) = self.notifier.cancel(id).await {
            tracing::warn!(quest_id, reminder_id = id.value(), error = %e, "failed to cancel reminder");
        }
    }

    /// Replace the quest's reminder after a deadline change
    pub async fn reschedule_for(&self, quest: &Quest) -> Option<DateTime<Utc>> {
        self.cancel_for(quest.id()).await;
        self.schedule_for(quest).await
    }

    /// React to a completion change: completing cancels, reopening does nothing
    pub async fn on_transition(&self, quest_id: &str, transition: CompletionTransition) {
        if transition == CompletionTransition::Completed {
            self.cancel_for(quest_id).await;
        }
    }
}

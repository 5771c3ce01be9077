//! Notification Boundary
//!
//! Platform scheduler for one-shot local alarms, gated by a permission the
//! platform grants or refuses.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::ReminderId;
use crate::error::NotifyResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionStatus {
    pub granted: bool,
}

/// A one-shot local alarm
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: ReminderId,
    pub title: String,
    pub body: String,
    pub fire_at: DateTime<Utc>,
}

#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    async fn request_permissions(&self) -> NotifyResult<PermissionStatus>;

    /// Schedule an alarm, replacing any pending alarm with the same id
    async fn schedule(&self, notification: Notification) -> NotifyResult<()>;

    /// Cancel a pending alarm; unknown ids are a no-op
    async fn cancel(&self, id: ReminderId) -> NotifyResult<()>;
}

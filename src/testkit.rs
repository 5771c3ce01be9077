//! Test doubles for the identity and notification boundaries, plus an
//! engine harness wired to the in-memory store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::auth::{IdentityProvider, User};
use crate::error::{AuthError, AuthResult, NotifyError, NotifyResult};
use crate::reminder::{
    ManualClock, Notification, NotificationScheduler, PermissionStatus, ReminderId,
    ReminderPolicy, ReminderScheduler,
};
use crate::repository::{DocumentStore, MemoryStore};
use crate::store::QuestState;
use crate::sync::SyncEngine;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

// ========================
// Notifications
// ========================

#[derive(Debug, Clone, PartialEq)]
pub enum NotifyCall {
    Schedule(Notification),
    Cancel(ReminderId),
}

pub struct RecordingNotifier {
    granted: bool,
    fail_schedule: bool,
    calls: Mutex<Vec<NotifyCall>>,
    pending: Mutex<HashMap<ReminderId, Notification>>,
}

impl RecordingNotifier {
    pub fn granted() -> Self {
        Self::build(true, false)
    }

    pub fn denied() -> Self {
        Self::build(false, false)
    }

    /// Permission granted but every schedule call fails
    pub fn failing() -> Self {
        Self::build(true, true)
    }

    fn build(granted: bool, fail_schedule: bool) -> Self {
        Self {
            granted,
            fail_schedule,
            calls: Mutex::new(Vec::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn calls(&self) -> Vec<NotifyCall> {
        lock(&self.calls).clone()
    }

    pub fn scheduled(&self) -> Vec<Notification> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                NotifyCall::Schedule(n) => Some(n),
                NotifyCall::Cancel(_) => None,
            })
            .collect()
    }

    pub fn cancels(&self) -> Vec<ReminderId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                NotifyCall::Cancel(id) => Some(id),
                NotifyCall::Schedule(_) => None,
            })
            .collect()
    }

    pub fn pending(&self, id: ReminderId) -> Option<Notification> {
        lock(&self.pending).get(&id).cloned()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
    }
}

#[async_trait]
impl NotificationScheduler for RecordingNotifier {
    async fn request_permissions(&self) -> NotifyResult<PermissionStatus> {
        Ok(PermissionStatus {
            granted: self.granted,
        })
    }

    async fn schedule(&self, notification: Notification) -> NotifyResult<()> {
        if self.fail_schedule {
            return Err(NotifyError::Platform("scheduler offline".to_string()));
        }
        lock(&self.calls).push(NotifyCall::Schedule(notification.clone()));
        lock(&self.pending).insert(notification.id, notification);
        Ok(())
    }

    async fn cancel(&self, id: ReminderId) -> NotifyResult<()> {
        lock(&self.calls).push(NotifyCall::Cancel(id));
        lock(&self.pending).remove(&id);
        Ok(())
    }
}

// ========================
// Identity
// ========================

/// Email/password accounts kept in memory; every successful operation
/// emits the resulting auth state on the event stream
pub struct ScriptedIdentity {
    sender: mpsc::UnboundedSender<Option<User>>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Option<User>>>>,
    accounts: Mutex<HashMap<String, (String, String)>>,
    offline: Mutex<bool>,
}

impl ScriptedIdentity {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            accounts: Mutex::new(HashMap::new()),
            offline: Mutex::new(false),
        }
    }

    pub fn with_account(self, email: &str, password: &str, uid: &str) -> Self {
        lock(&self.accounts).insert(email.to_string(), (password.to_string(), uid.to_string()));
        self
    }

    pub fn set_offline(&self, offline: bool) {
        *lock(&self.offline) = offline;
    }

    /// Push a raw auth event
    pub fn emit(&self, user: Option<User>) {
        let _ = self.sender.send(user);
    }

    fn check_online(&self) -> AuthResult<()> {
        if *lock(&self.offline) {
            Err(AuthError::Network("offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentity {
    fn auth_state_changes(&self) -> mpsc::UnboundedReceiver<Option<User>> {
        lock(&self.receiver).take().unwrap_or_else(|| {
            let (_closed, receiver) = mpsc::unbounded_channel();
            receiver
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<()> {
        self.check_online()?;
        let uid = match lock(&self.accounts).get(email) {
            Some((stored, uid)) if stored == password => uid.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        self.emit(Some(User::new(uid, Some(email.to_string()))));
        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<()> {
        self.check_online()?;
        if password.len() < 6 {
            return Err(AuthError::WeakPassword("at least 6 characters".to_string()));
        }
        let uid = {
            let mut accounts = lock(&self.accounts);
            if accounts.contains_key(email) {
                return Err(AuthError::AccountExists);
            }
            let uid = format!("uid-{}", accounts.len() + 1);
            accounts.insert(email.to_string(), (password.to_string(), uid.clone()));
            uid
        };
        self.emit(Some(User::new(uid, Some(email.to_string()))));
        Ok(())
    }

    async fn sign_in_with_google(&self) -> AuthResult<()> {
        self.check_online()?;
        self.emit(Some(User::new("google-uid", Some("player@gmail.com".to_string()))));
        Ok(())
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.check_online()?;
        self.emit(None);
        Ok(())
    }
}

// ========================
// Engine harness
// ========================

pub fn test_now() -> DateTime<Utc> {
    "2026-06-01T10:00:00Z".parse().unwrap()
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub engine: SyncEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        Self::wired(store.clone(), store)
    }

    /// Engine talking to `remote`, which may wrap `store`
    pub fn wired(store: Arc<MemoryStore>, remote: Arc<dyn DocumentStore>) -> Self {
        let notifier = Arc::new(RecordingNotifier::granted());
        let clock = Arc::new(ManualClock::new(test_now()));
        let reminders =
            ReminderScheduler::new(notifier.clone(), clock.clone(), ReminderPolicy::default());
        Self {
            store,
            notifier,
            clock,
            engine: SyncEngine::new(remote, reminders),
        }
    }

    /// Bind `uid` and wait for its first quests snapshot
    pub async fn bound(uid: &str) -> Self {
        let harness = Self::new();
        harness.engine.bind(uid).await;
        harness.settle(|s| !s.loading).await;
        harness
    }

    /// Wait until the mirrored state satisfies `pred`
    pub async fn settle(&self, pred: impl FnMut(&QuestState) -> bool) -> QuestState {
        let mut rx = self.engine.subscribe();
        let state = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
            .await
            .expect("state never settled")
            .expect("state channel closed");
        QuestState::clone(&state)
    }

    /// Give in-flight snapshots a chance to land
    pub async fn drain(&self) {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

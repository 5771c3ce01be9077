//! Sync Engine
//!
//! Bridges the mirrored state and the remote per-user store.
//!
//! Binding to a user opens two live listeners (quest-lines, quests). Each
//! event carries the full collection and replaces the mirrored copy. The
//! listeners are the only writer of mirrored state: mutations build the
//! next document from the current snapshot, overwrite it remotely, and let
//! the next event reconcile. Nothing is advanced optimistically, so a
//! failed write leaves the mirror exactly as it was.
//!
//! Rebinding tears down the old listeners before opening new ones, and the
//! mirror is cleared in between. Bind and unbind serialize on one lock, so
//! two listener sets are never live at once. When attached to a session,
//! mutations only run while the mirror and the session agree on the user.


use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::domain::{Document, Quest, QuestLine};
use crate::error::StoreResult;
use crate::reminder::ReminderScheduler;
use crate::repository::{
    CollectionPath, CollectionSnapshot, DocumentSnapshot, DocumentStore, ListenerHandle,
};
use crate::session::SessionState;
use crate::store::{AppStore, QuestState};

/// Listeners and pump tasks of the bound user
struct Binding {
    uid: String,
    generation: u64,
    listeners: Vec<ListenerHandle>,
    pumps: Vec<JoinHandle<()>>,
}

pub struct SyncEngine {
    store: Arc<dyn DocumentStore>,
    reminders: ReminderScheduler,
    state: Arc<AppStore>,
    binding: Mutex<Option<Binding>>,
    session: Option<watch::Receiver<SessionState>>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn DocumentStore>, reminders: ReminderScheduler) -> Self {
        Self {
            store,
            reminders,
            state: Arc::new(AppStore::new()),
            binding: Mutex::new(None),
            session: None,
        }
    }

    /// Check every mutation against the session's current user
    pub fn with_session(mut self, session: watch::Receiver<SessionState>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn state(&self) -> &AppStore {
        &self.state
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<QuestState> {
        self.state.subscribe()
    }

    pub fn reminders(&self) -> &ReminderScheduler {
        &self.reminders
    }

    /// Uid the mirror belongs to; `None` while unbound or mid-transition
    pub fn current_uid(&self) -> Option<String> {
        let uid = self.state.bound_uid()?;
        if let Some(session) = &self.session {
            let signed_in = session.borrow().user().is_some_and(|user| user.uid == uid);
            if !signed_in {
                return None;
            }
        }
        Some(uid)
    }

    // ========================
    // Binding lifecycle
    // ========================

    /// Mirror `uid`'s collections, replacing any previous binding
    pub async fn bind(&self, uid: &str) {
        let mut binding = self.binding.lock().await;
        if binding.as_ref().is_some_and(|b| b.uid == uid) {
            return;
        }

        self.teardown(&mut binding).await;

        let generation = self.state.begin_generation(uid);
        match self.open_listeners(uid, generation).await {
            Ok(active) => {
                tracing::info!(uid, generation, "sync bound");
                *binding = Some(active);
            }
            Err(e) => {
                tracing::error!(uid, error = %e, "failed to set up listeners");
                self.state.stop_loading(generation);
                *binding = Some(Binding {
                    uid: uid.to_string(),
                    generation,
                    listeners: Vec::new(),
                    pumps: Vec::new(),
                });
            }
        }
    }

    /// Drop the binding and all mirrored data
    pub async fn unbind(&self) {
        let mut binding = self.binding.lock().await;
        self.teardown(&mut binding).await;
        self.state.clear();
    }

    async fn teardown(&self, binding: &mut Option<Binding>) {
        let Some(old) = binding.take() else {
            return;
        };

        // Invalidate first: anything still in flight now carries a stale generation.
        self.state.clear();
        for pump in &old.pumps {
            pump.abort();
        }
        for handle in old.listeners {
            self.remove_listener(handle).await;
        }
        tracing::info!(uid = %old.uid, generation = old.generation, "sync unbound");
    }

    async fn open_listeners(&self, uid: &str, generation: u64) -> StoreResult<Binding> {
        let lines = self
            .store
            .add_snapshot_listener(&CollectionPath::of::<QuestLine>(uid))
            .await?;
        let quests = match self
            .store
            .add_snapshot_listener(&CollectionPath::of::<Quest>(uid))
            .await
        {
            Ok(listener) => listener,
            Err(e) => {
                self.remove_listener(lines.handle).await;
                return Err(e);
            }
        };

        let pumps = vec![
            self.spawn_pump(generation, lines.events, AppStore::replace_quest_lines),
            self.spawn_pump(generation, quests.events, AppStore::replace_quests),
        ];

        Ok(Binding {
            uid: uid.to_string(),
            generation,
            listeners: vec![lines.handle, quests.handle],
            pumps,
        })
    }

    /// Forward decoded snapshots into the mirror until the generation goes stale
    fn spawn_pump<T: Document + 'static>(
        &self,
        generation: u64,
        mut events: mpsc::UnboundedReceiver<CollectionSnapshot>,
        apply: fn(&AppStore, u64, Vec<T>) -> bool,
    ) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            while let Some(snapshot) = events.recv().await {
                let entities = decode_collection::<T>(&snapshot);
                if !apply(&state, generation, entities) {
                    tracing::debug!(generation, collection = T::COLLECTION, "discarded stale snapshot");
                    break;
                }
            }
        })
    }

    async fn remove_listener(&self, handle: ListenerHandle) {
        if let Err(e) = self.store.remove_snapshot_listener(handle).await {
            tracing::warn!(listener = handle.0, error = %e, "failed to remove listener");
        }
    }

    // ========================
    // Document writes
    // ========================

    /// Overwrite the entity's document; `false` when the store refused
    pub(crate) async fn write<T: Document>(&self, uid: &str, entity: &T) -> bool {
        let path = CollectionPath::of::<T>(uid).doc(entity.id());
        let data = match serde_json::to_value(entity) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(path = %path, error = %e, "failed to encode document");
                return false;
            }
        };

        match self.store.set_document(&path, data).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(path = %path, error = %e, "failed to write document");
                false
            }
        }
    }

    /// Delete the entity's document; `false` when the store refused
    pub(crate) async fn remove<T: Document>(&self, uid: &str, id: &str) -> bool {
        let path = CollectionPath::of::<T>(uid).doc(id);
        match self.store.delete_document(&path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(path = %path, error = %e, "failed to delete document");
                false
            }
        }
    }
}

/// Decode a collection snapshot, skipping documents that do not parse
pub fn decode_collection<T: Document>(snapshot: &[DocumentSnapshot]) -> Vec<T> {
    snapshot
        .iter()
        .filter_map(|doc| match T::from_snapshot(&doc.id, &doc.data) {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!(
                    collection = T::COLLECTION,
                    document_id = %doc.id,
                    error = %e,
                    "skipping undecodable document"
                );
                None
            }
        })
        .collect()
}

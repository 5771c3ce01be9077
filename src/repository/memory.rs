//! In-Memory Document Store
//!
//! `DocumentStore` kept entirely in process. Listeners receive the current
//! collection on registration and again after every write to it, which is
//! the delivery model of the remote store. Used for local-only mode and as
//! the store behind the engine tests (operation log, failure injection).

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::paths::{CollectionPath, DocumentPath};
use super::traits::{
    CollectionSnapshot, DocumentSnapshot, DocumentStore, ListenerHandle, SnapshotListener,
};
use crate::error::{StoreError, StoreResult};

/// A store call that succeeded, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Listen(CollectionPath),
    Unlisten(ListenerHandle),
    Set(DocumentPath),
    Delete(DocumentPath),
}

#[derive(Default)]
struct Inner {
    collections: HashMap<CollectionPath, BTreeMap<String, Value>>,
    listeners: HashMap<ListenerHandle, (CollectionPath, mpsc::UnboundedSender<CollectionSnapshot>)>,
    next_handle: u64,
    ops: Vec<StoreOp>,
    /// Writes still allowed before every write fails; `None` = unlimited
    write_budget: Option<usize>,
    fail_listeners: bool,
}

impl Inner {
    fn snapshot(&self, path: &CollectionPath) -> CollectionSnapshot {
        self.collections
            .get(path)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| DocumentSnapshot {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn take_write(&mut self, path: &DocumentPath) -> StoreResult<()> {
        match self.write_budget.as_mut() {
            Some(0) => Err(StoreError::Unavailable(format!("write to {} rejected", path))),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Push the collection to its listeners, dropping closed ones
    fn broadcast(&mut self, path: &CollectionPath) {
        let snapshot = self.snapshot(path);
        self.listeners.retain(|_, (listened, sender)| {
            if &*listened != path {
                return true;
            }
            sender.send(snapshot.clone()).is_ok()
        });
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Put a document in place without logging or notifying
    pub fn seed(&self, path: &DocumentPath, data: Value) {
        self.lock()
            .collections
            .entry(path.collection().clone())
            .or_default()
            .insert(path.id().to_string(), data);
    }

    pub fn document(&self, path: &DocumentPath) -> Option<Value> {
        self.lock()
            .collections
            .get(path.collection())
            .and_then(|docs| docs.get(path.id()))
            .cloned()
    }

    pub fn collection(&self, path: &CollectionPath) -> CollectionSnapshot {
        self.lock().snapshot(path)
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.lock().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.lock().ops.clear();
    }

    pub fn active_listeners(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Reject every write from now on
    pub fn fail_writes(&self) {
        self.lock().write_budget = Some(0);
    }

    /// Allow `count` more writes, then reject the rest
    pub fn fail_writes_after(&self, count: usize) {
        self.lock().write_budget = Some(count);
    }

    pub fn allow_writes(&self) {
        self.lock().write_budget = None;
    }

    /// Make listener registration fail
    pub fn fail_listeners(&self, fail: bool) {
        self.lock().fail_listeners = fail;
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add_snapshot_listener(&self, path: &CollectionPath) -> StoreResult<SnapshotListener> {
        let mut inner = self.lock();
        if inner.fail_listeners {
            return Err(StoreError::PermissionDenied(format!("cannot listen to {}", path)));
        }

        let (sender, events) = mpsc::unbounded_channel();
        inner.next_handle += 1;
        let handle = ListenerHandle(inner.next_handle);

        // The current contents arrive as the first event.
        let initial = inner.snapshot(path);
        let _ = sender.send(initial);

        inner.listeners.insert(handle, (path.clone(), sender));
        inner.ops.push(StoreOp::Listen(path.clone()));
        Ok(SnapshotListener { handle, events })
    }

    async fn remove_snapshot_listener(&self, handle: ListenerHandle) -> StoreResult<()> {
        let mut inner = self.lock();
        if inner.listeners.remove(&handle).is_some() {
            inner.ops.push(StoreOp::Unlisten(handle));
        }
        Ok(())
    }

    async fn set_document(&self, path: &DocumentPath, data: Value) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.take_write(path)?;

        inner
            .collections
            .entry(path.collection().clone())
            .or_default()
            .insert(path.id().to_string(), data);
        inner.ops.push(StoreOp::Set(path.clone()));
        inner.broadcast(path.collection());
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.take_write(path)?;

        if let Some(docs) = inner.collections.get_mut(path.collection()) {
            docs.remove(path.id());
        }
        inner.ops.push(StoreOp::Delete(path.clone()));
        inner.broadcast(path.collection());
        Ok(())
    }
}

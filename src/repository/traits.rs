//! Repository Layer - Store Boundary
//!
//! The remote per-user document store as seen by the client. Collections
//! are observed through live listeners that deliver the full collection on
//! every change; documents are written whole and deleted by path.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::paths::{CollectionPath, DocumentPath};
use crate::error::StoreResult;

/// One document of a collection snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    pub data: serde_json::Value,
}

/// Full current contents of a collection
pub type CollectionSnapshot = Vec<DocumentSnapshot>;

/// Identifies a live listener for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(pub u64);

/// A registered listener and the stream of snapshots it delivers
#[derive(Debug)]
pub struct SnapshotListener {
    pub handle: ListenerHandle,
    pub events: mpsc::UnboundedReceiver<CollectionSnapshot>,
}

/// Remote document store
///
/// All operations are async; delivery of listener events is eventual.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Start listening to a collection
    async fn add_snapshot_listener(&self, path: &CollectionPath) -> StoreResult<SnapshotListener>;

    /// Stop a listener; unknown handles are ignored
    async fn remove_snapshot_listener(&self, handle: ListenerHandle) -> StoreResult<()>;

    /// Overwrite the whole document
    async fn set_document(&self, path: &DocumentPath, data: serde_json::Value) -> StoreResult<()>;

    /// Delete the document
    async fn delete_document(&self, path: &DocumentPath) -> StoreResult<()>;
}

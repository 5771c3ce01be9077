//! Repository Layer
//!
//! Remote store abstraction and implementations.

mod memory;
mod paths;
mod traits;


pub use memory::{MemoryStore, StoreOp};
pub use paths::{CollectionPath, DocumentPath};
pub use traits::{
    CollectionSnapshot, DocumentSnapshot, DocumentStore, ListenerHandle, SnapshotListener,
};

//! Store Paths
//!
//! Per-user collection and document paths:
//! `users/{uid}/{collection}` and `users/{uid}/{collection}/{id}`.

use std::fmt;

use crate::domain::Document;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn user_collection(uid: &str, collection: &str) -> Self {
        Self(format!("users/{}/{}", uid, collection))
    }

    /// The collection holding documents of type `T` for one user
    pub fn of<T: Document>(uid: &str) -> Self {
        Self::user_collection(uid, T::COLLECTION)
    }

    pub fn doc(&self, id: &str) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    /// Parse `users/{uid}/{collection}/{id}`
    pub fn parse(path: &str) -> StoreResult<Self> {
        let segments: Vec<&str> = path.split('/').collect();
        match segments.as_slice() {
            ["users", uid, collection, id]
                if !uid.is_empty() && !collection.is_empty() && !id.is_empty() =>
            {
                Ok(CollectionPath::user_collection(uid, collection).doc(id))
            }
            _ => Err(StoreError::InvalidPath(path.to_string())),
        }
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

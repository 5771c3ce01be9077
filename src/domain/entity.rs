//! Domain Layer - Core Entity Traits
//!
//! Every entity carries an opaque, client-generated string id that never
//! changes once assigned. Entities stored as remote documents also name
//! their collection and know how to rebuild themselves from a snapshot.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// Returns the entity's unique identifier
    fn id(&self) -> &str;
}

/// An entity persisted as one document of a per-user collection
pub trait Document: Entity + Serialize + DeserializeOwned {
    /// Collection name under `users/{uid}/`
    const COLLECTION: &'static str;

    /// Bind the value to the id of the document it was read from
    fn with_document_id(self, id: String) -> Self;

    /// Decode a snapshot entry; the document id wins over any id in the body
    fn from_snapshot(id: &str, data: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let entity: Self = serde_json::from_value(data.clone())?;
        Ok(entity.with_document_id(id.to_string()))
    }
}

/// Generate a new globally-unique entity id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Find an entity by id in a mirrored collection
pub fn find_by_id<'a, T: Entity>(entities: &'a [T], id: &str) -> Option<&'a T> {
    entities.iter().find(|entity| entity.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}

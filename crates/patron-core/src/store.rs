//! Logical identity store contract.
//!
//! The engine only ever loads the whole gallery and appends new identities;
//! the concrete backend (SQLite in `patron-store`) is a collaborator, not a
//! concern of this crate.

use crate::types::{Embedding, Identity};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend: {0}")]
    Backend(String),
    #[error("prototype serialization: {0}")]
    Serialization(String),
}

/// Load-all / append contract over enrolled identities.
pub trait IdentityStore {
    /// Full gallery scan. Corrupt records are skipped by the backend with a
    /// logged warning, never surfaced as an error here.
    fn load_all(&self) -> Result<Vec<Identity>, StoreError>;

    /// Persist a new identity. Re-enrollment always appends a new record;
    /// nothing in this contract mutates in place.
    fn append(&self, name: &str, prototype: &Embedding) -> Result<Identity, StoreError>;
}

/// Vec-backed store, used in tests and for kiosks running without a
/// persistent database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    identities: Mutex<Vec<Identity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.identities.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<Identity>, StoreError> {
        let guard = self
            .identities
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(guard.clone())
    }

    fn append(&self, name: &str, prototype: &Embedding) -> Result<Identity, StoreError> {
        let identity = Identity {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            prototype: prototype.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let mut guard = self
            .identities
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        guard.push(identity.clone());
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load_all().unwrap().is_empty());

        let proto = Embedding::new(vec![0.1, 0.2, 0.3]);
        let id = store.append("Kim", &proto).unwrap();
        assert_eq!(id.name, "Kim");
        assert!(!id.id.is_empty());
        assert!(!id.created_at.is_empty());

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].prototype, proto);
    }

    #[test]
    fn test_append_never_replaces() {
        let store = MemoryStore::new();
        let proto = Embedding::new(vec![1.0]);
        store.append("Kim", &proto).unwrap();
        store.append("Kim", &proto).unwrap();
        assert_eq!(store.len(), 2);
    }
}

//! In-memory scoped storage.
//!
//! Session-lifetime storage for hosts without a persistent store, and the
//! default in tests.

use crate::error::StorageError;
use crate::ports::outbound::ScopedStorage;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Thread-safe key/value map.
#[derive(Debug, Default)]
pub struct InMemoryScopedStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryScopedStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ScopedStorage for InMemoryScopedStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

//! # Idempotency Store
//!
//! Tracks the one outstanding submission per storage key so that a resubmission
//! of the same not-yet-confirmed payload is recognised as a retry.
//!
//! Storage failures are swallowed and logged: idempotency degrades to "no
//! retry detection" instead of failing the submission.

use crate::domain::identifier::RequestIdentifier;
use crate::ports::outbound::{ScopedStorage, TimeSource, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Persisted pending record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSubmission {
    pub id: RequestIdentifier,
    /// Milliseconds since epoch
    pub created_at: Timestamp,
}

/// Pending-submission tracking over scoped storage.
pub struct IdempotencyStore {
    storage: Arc<dyn ScopedStorage>,
    time_source: Arc<dyn TimeSource>,
}

impl IdempotencyStore {
    pub fn new(storage: Arc<dyn ScopedStorage>, time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            storage,
            time_source,
        }
    }

    /// Pending identifier under `key`, if present and younger than `ttl_ms`.
    ///
    /// Expired or unreadable records are deleted and read as absent.
    pub fn get_pending(&self, key: &str, ttl_ms: u64) -> Option<RequestIdentifier> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Pending record read failed");
                return None;
            }
        };

        let record: PendingSubmission = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(key, error = %e, "Discarding unreadable pending record");
                self.clear(key);
                return None;
            }
        };

        let age = self.time_source.now().saturating_sub(record.created_at);
        if age > ttl_ms {
            debug!(key, id = %record.id, age_ms = age, "Pending record expired");
            self.clear(key);
            return None;
        }

        Some(record.id)
    }

    /// Overwrite the pending record (last write wins). Best effort.
    pub fn set_pending(&self, key: &str, id: &RequestIdentifier) {
        let record = PendingSubmission {
            id: id.clone(),
            created_at: self.time_source.now(),
        };
        let encoded = match serde_json::to_string(&record) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key, error = %e, "Pending record encoding failed");
                return;
            }
        };

        match self.storage.set(key, &encoded) {
            Ok(()) => debug!(key, id = %id, "Pending record written"),
            Err(e) => warn!(key, id = %id, error = %e, "Pending record write failed; retry detection disabled"),
        }
    }

    /// Remove the pending record. Best effort.
    pub fn clear(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            warn!(key, error = %e, "Pending record delete failed");
        }
    }

    /// Whether `id` matches the live pending record.
    pub fn is_retry(&self, key: &str, ttl_ms: u64, id: &RequestIdentifier) -> bool {
        self.get_pending(key, ttl_ms).as_ref() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryScopedStorage;
    use crate::error::StorageError;
    use crate::ports::outbound::MockTimeSource;

    const KEY: &str = "qs:pending-submission";
    const TTL: u64 = 300_000;

    fn id(byte: char) -> RequestIdentifier {
        RequestIdentifier::parse(&byte.to_string().repeat(64)).unwrap()
    }

    struct BrokenStorage;

    impl ScopedStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("private mode".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::WriteRejected("quota exceeded".into()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("private mode".into()))
        }
    }

    fn setup() -> (IdempotencyStore, Arc<InMemoryScopedStorage>, Arc<MockTimeSource>) {
        let storage = Arc::new(InMemoryScopedStorage::new());
        let time = Arc::new(MockTimeSource::new(1_000_000));
        let store = IdempotencyStore::new(storage.clone(), time.clone());
        (store, storage, time)
    }

    #[test]
    fn test_pending_until_ttl() {
        let (store, storage, time) = setup();
        store.set_pending(KEY, &id('a'));

        assert_eq!(store.get_pending(KEY, TTL), Some(id('a')));
        time.advance(TTL);
        assert_eq!(store.get_pending(KEY, TTL), Some(id('a')));

        time.advance(1);
        assert_eq!(store.get_pending(KEY, TTL), None);
        // Expired records are deleted on read.
        assert_eq!(storage.get(KEY).unwrap(), None);
    }

    #[test]
    fn test_last_write_wins() {
        let (store, _, _) = setup();
        store.set_pending(KEY, &id('a'));
        store.set_pending(KEY, &id('b'));

        assert!(store.is_retry(KEY, TTL, &id('b')));
        assert!(!store.is_retry(KEY, TTL, &id('a')));
    }

    #[test]
    fn test_clear() {
        let (store, _, _) = setup();
        store.set_pending(KEY, &id('c'));
        store.clear(KEY);
        assert_eq!(store.get_pending(KEY, TTL), None);
        // Clearing twice is fine.
        store.clear(KEY);
    }

    #[test]
    fn test_corrupt_record_is_discarded() {
        let (store, storage, _) = setup();
        storage.set(KEY, "not json").unwrap();
        assert_eq!(store.get_pending(KEY, TTL), None);
        assert_eq!(storage.get(KEY).unwrap(), None);
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let store = IdempotencyStore::new(Arc::new(BrokenStorage), Arc::new(MockTimeSource::new(0)));
        store.set_pending(KEY, &id('d'));
        store.clear(KEY);
        assert_eq!(store.get_pending(KEY, TTL), None);
        assert!(!store.is_retry(KEY, TTL, &id('d')));
    }

    #[test]
    fn test_record_wire_shape() {
        let (store, storage, _) = setup();
        store.set_pending(KEY, &id('e'));
        let raw: serde_json::Value = serde_json::from_str(&storage.get(KEY).unwrap().unwrap()).unwrap();
        assert_eq!(raw["id"], "e".repeat(64));
        assert_eq!(raw["createdAt"], 1_000_000);
    }
}

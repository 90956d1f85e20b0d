//! # Outbound Ports (Driven Ports)
//!
//! Collaborators the submission core depends on but does not implement:
//! canonicalization, transport, scoped storage, time, the host primitive probe
//! and the strong-suite module.

use crate::domain::identifier::CanonicalPayload;
use crate::domain::outcome::TransportResponse;
use crate::error::{CanonicalizeError, SealError, StorageError, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use shared_crypto::Encapsulation;
use std::sync::Arc;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Deterministic payload normalization.
///
/// Contract: identical semantic input yields a byte-identical
/// `CanonicalPayload::to_canonical_bytes()`.
pub trait Canonicalizer: Send + Sync {
    /// Normalize a raw payload.
    fn canonicalize(&self, raw: &Value) -> Result<CanonicalPayload, CanonicalizeError>;
}

/// Delivery of a serialized submission to the collector.
///
/// Timeouts are the implementation's responsibility; the core never cancels.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `endpoint` and return the raw status and JSON body.
    async fn send(&self, endpoint: &str, body: String) -> Result<TransportResponse, TransportError>;
}

/// Session-lifetime key/value storage.
///
/// Failures are non-fatal to the core; TTL comparison is the caller's job.
pub trait ScopedStorage: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Probe of the host's basic primitives (randomness, hashing, AEAD).
pub trait PrimitiveProbe: Send + Sync {
    /// `Err` carries a diagnostic describing what is missing.
    fn probe(&self) -> Result<(), String>;
}

/// A loaded strong-suite (post-quantum KEM) module.
pub trait StrongSuiteModule: Send + Sync {
    /// Algorithm name, for logs.
    fn name(&self) -> &'static str;

    /// Encapsulate a fresh shared secret to the recipient's strong-suite key.
    ///
    /// # Errors
    /// * `SealError::EncapsulationFailed` - the operation itself failed
    /// * `SealError::InvalidKey` - the recipient key is malformed
    fn encapsulate(&self, recipient_public: &[u8]) -> Result<Encapsulation, SealError>;
}

/// Loads the strong-suite module on first use.
///
/// Loading may have host-visible side effects (for example a content-policy
/// report), which is why it is deferred until a seal actually needs it.
#[async_trait]
pub trait StrongSuiteLoader: Send + Sync {
    /// # Errors
    /// * `SealError::ModuleUnavailable` - the module could not be loaded
    async fn load(&self) -> Result<Arc<dyn StrongSuiteModule>, SealError>;
}

/// Mock time source for testing.
#[cfg(test)]
pub struct MockTimeSource {
    time: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl MockTimeSource {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}

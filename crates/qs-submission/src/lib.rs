//! # Quantum-Seal Secure Submission
//!
//! Turns a form payload into a confidentiality-protected envelope, chooses the
//! key-establishment suite under a configurable policy, and delivers the
//! envelope idempotently to a remote collector.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Submission logic
//!   - `generate_identifier`: SHA-256 content address of a canonical payload
//!   - `CapabilityDetector`: Cached host capability with one-way strong-suite promotion
//!   - `seal_classical` / `seal_hybrid` / `open_envelope`: Envelope construction
//!   - `PolicyEngine`: Strict vs best-effort sealing and downgrade classification
//!   - `IdempotencyStore`: One pending identifier per storage key, with TTL
//!   - `RateLimiter`: Sliding-window admission, bypassed for retries
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `SecureSubmissionApi`: Driving port (inbound API)
//!   - `Canonicalizer`, `Transport`, `ScopedStorage`, `TimeSource`,
//!     `PrimitiveProbe`, `StrongSuiteLoader`: Driven ports
//!
//! - **Service Layer** (`service.rs`): Orchestration
//!   - `SubmissionService`: Implements `SecureSubmissionApi`
//!
//! - **Adapters Layer** (`adapters/`): Reference port implementations
//!
//! ## Invariants
//!
//! - A classical envelope carries empty-string long-suite wrap fields, never
//!   absent ones.
//! - Strict mode never emits a downgrade event and never reaches the transport.
//! - The pending record is written before the transport is called and only
//!   after every policy gate has passed.
//! - Retries are neither checked against nor recorded in the rate window.
//!
//! ## Usage Example
//!
//! ```ignore
//! use qs_submission::{
//!     FormCanonicalizer, SecureSubmissionApi, SubmissionConfig, SubmissionService,
//! };
//! use std::sync::Arc;
//!
//! let config = SubmissionConfig::from_toml_str(include_str!("submission.toml"))?;
//! let service = SubmissionService::builder(
//!     config,
//!     Arc::new(FormCanonicalizer::default()),
//!     Arc::new(my_http_transport),
//! )
//! .build()?;
//!
//! let report = service.submit(serde_json::json!({"email": "a@b.com"})).await;
//! if let Some(event) = &report.downgrade {
//!     tracing::warn!(reason = event.reason.as_str(), "sealed classically");
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{
    BuiltinStrongSuiteLoader, DisabledStrongSuiteLoader, FormCanonicalizer, HostPrimitiveProbe,
    InMemoryScopedStorage, MlKem768Module,
};
pub use domain::{
    classify_failure, classify_response, generate_identifier, open_envelope, seal_classical,
    seal_hybrid, CanonicalPayload, CapabilityDetector, CryptoCapability, DowngradeEvent,
    DowngradeReason, Envelope, IdempotencyStore, OutboundSubmission, PublicKeysConfig,
    RateLimitSetting, RateLimitWindow, RateLimiter, RequestIdentifier, SealContext,
    StrongSuiteSlot, SubmissionConfig, SubmissionOutcome, SubmissionReport, SubmissionState,
    SubmitResult, SubmitStatus, Suite, TransportResponse,
};
pub use error::{
    CanonicalizeError, ConfigError, RejectionKind, SealError, StorageError, SubmitError,
    TransportError,
};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{
    Canonicalizer, PrimitiveProbe, ScopedStorage, SecureSubmissionApi, StrongSuiteLoader,
    StrongSuiteModule, SystemTimeSource, TimeSource, Timestamp, Transport,
};
pub use service::{SubmissionContext, SubmissionService, SubmissionServiceBuilder};

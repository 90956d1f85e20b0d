//! Domain Layer - submission logic
//!
//! This layer contains:
//! - Request identifiers (content addresses)
//! - Capability detection and the strong-suite lazy cell
//! - Envelope sealing and the generic open path
//! - Seal policy and downgrade classification
//! - Pending-submission tracking and the rate limiter
//! - Response classification and submission outcomes
//! - Configuration
//!
//! RULES:
//! - No transport or storage implementations
//! - Async only where the strong-suite load demands it

pub mod capability;
pub mod config;
pub mod envelope;
pub mod identifier;
pub mod idempotency;
pub mod outcome;
pub mod policy;
pub mod rate_limit;
pub mod strong_suite;

pub use capability::{CapabilityDetector, CryptoCapability};
pub use config::{
    PublicKeysConfig, RateLimitSetting, RateLimitWindow, RecipientPublicKeys, SubmissionConfig,
};
pub use envelope::{
    check_classical_key, open_envelope, seal_classical, seal_hybrid, Envelope, EnvelopeMeta,
    KeyWrap, LongSuiteWrap, SealContext, Suite,
};
pub use identifier::{generate_identifier, CanonicalPayload, RequestIdentifier, IDENTIFIER_HEX_LEN};
pub use idempotency::{IdempotencyStore, PendingSubmission};
pub use outcome::{
    classify_response, OutboundSubmission, ResponseClass, SubmissionOutcome, SubmissionReport,
    SubmissionState, SubmitResult, SubmitStatus, TransportResponse,
};
pub use policy::{
    classify_failure, DowngradeEvent, DowngradeReason, PolicyEngine, PolicyOutcome,
    PolicySettings, PolicyState,
};
pub use rate_limit::RateLimiter;
pub use strong_suite::StrongSuiteSlot;

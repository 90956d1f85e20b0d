//! Error types for the secure-submission core.
//!
//! `SubmitError`'s `Display` text is the plain, user-facing message placed in
//! `SubmitResult::Failure`. Internal detail stays in `SealError` and never
//! leaves the process unless downgrade debugging is switched on.

use shared_crypto::CryptoError;
use thiserror::Error;

/// Envelope builder failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SealError {
    /// Recipient key input is malformed.
    #[error("Invalid recipient key: {0}")]
    InvalidKey(String),

    /// The strong-suite module could not be loaded.
    #[error("Strong-suite module unavailable: {0}")]
    ModuleUnavailable(String),

    /// The strong-suite module loaded but encapsulation or wrapping failed.
    #[error("Strong-suite encapsulation failed: {0}")]
    EncapsulationFailed(String),

    /// An envelope could not be parsed or opened.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Creation time outside the representable date range.
    #[error("Invalid creation timestamp: {0} ms")]
    InvalidTimestamp(u64),

    /// Underlying primitive failure.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl SealError {
    /// Raw failure text, used only to classify downgrade reasons.
    pub fn message(&self) -> String {
        match self {
            SealError::InvalidKey(m)
            | SealError::ModuleUnavailable(m)
            | SealError::EncapsulationFailed(m)
            | SealError::MalformedEnvelope(m) => m.clone(),
            SealError::InvalidTimestamp(_) => self.to_string(),
            SealError::Crypto(e) => e.to_string(),
        }
    }

    /// Whether the failure belongs to the strong-suite step rather than the
    /// classical half of a seal.
    pub fn is_strong_suite_failure(&self) -> bool {
        matches!(
            self,
            SealError::ModuleUnavailable(_) | SealError::EncapsulationFailed(_)
        )
    }
}

/// Which policy gate rejected a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionKind {
    /// Sliding-window rate limit denied admission.
    RateLimited,
    /// Host lacks the primitives for even the classical suite.
    CapabilityMissing,
    /// Serialized plaintext over the ceiling.
    PlaintextTooLarge,
    /// Serialized envelope over the ceiling.
    EnvelopeTooLarge,
    /// Strict mode and the strong suite failed.
    StrictMode,
}

impl RejectionKind {
    /// Stable label for logs and metrics.
    pub const fn as_str(self) -> &'static str {
        match self {
            RejectionKind::RateLimited => "rate_limited",
            RejectionKind::CapabilityMissing => "capability_missing",
            RejectionKind::PlaintextTooLarge => "plaintext_too_large",
            RejectionKind::EnvelopeTooLarge => "envelope_too_large",
            RejectionKind::StrictMode => "strict_mode",
        }
    }
}

/// Submission failures, grouped as policy rejections, builder failures and
/// transport outcomes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Too many submissions. Please wait a minute and try again.")]
    RateLimited,

    #[error("Secure submission is not supported in this environment: {0}")]
    CapabilityMissing(String),

    #[error("Submission is too large ({size} bytes; limit is {max} bytes).")]
    PlaintextTooLarge { size: usize, max: usize },

    #[error("Encrypted submission is too large ({size} bytes; limit is {max} bytes).")]
    EnvelopeTooLarge { size: usize, max: usize },

    #[error(
        "Strict mode is enabled and the post-quantum suite is unavailable; the submission was not sent."
    )]
    StrictModeUnavailable,

    #[error("Could not encrypt the submission: {0}")]
    Builder(#[from] SealError),

    #[error("Could not prepare the submission: {0}")]
    Canonicalization(String),

    #[error("Could not encode the submission: {0}")]
    Serialization(String),

    /// 2xx response whose body reports failure.
    #[error("{0}")]
    ServerRejected(String),

    /// 4xx response.
    #[error("{message}")]
    ClientRejected { status: u16, message: String },

    /// 5xx or unrecognised status.
    #[error("The server could not process the submission (status {status}). Please try again.")]
    ServerFailure { status: u16 },

    /// Transport-level failure before a response arrived.
    #[error("{0}")]
    Network(String),
}

impl SubmitError {
    /// The policy gate behind this error, if it is a policy rejection.
    pub fn rejection_kind(&self) -> Option<RejectionKind> {
        match self {
            SubmitError::RateLimited => Some(RejectionKind::RateLimited),
            SubmitError::CapabilityMissing(_) => Some(RejectionKind::CapabilityMissing),
            SubmitError::PlaintextTooLarge { .. } => Some(RejectionKind::PlaintextTooLarge),
            SubmitError::EnvelopeTooLarge { .. } => Some(RejectionKind::EnvelopeTooLarge),
            SubmitError::StrictModeUnavailable => Some(RejectionKind::StrictMode),
            _ => None,
        }
    }
}

/// Scoped storage failures. Never fatal to a submission.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Storage write rejected: {0}")]
    WriteRejected(String),
}

/// Transport collaborator failure (no response was received).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,
}

/// Canonicalizer collaborator failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CanonicalizeError {
    #[error("Payload must be a JSON object")]
    NotAnObject,

    #[error("Invalid payload: {0}")]
    Invalid(String),
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Endpoint must not be empty")]
    MissingEndpoint,

    #[error("Invalid size limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid rate limit: {0}")]
    InvalidRateLimit(String),

    #[error("Pending TTL must be greater than zero")]
    InvalidTtl,

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Unknown AEAD: {0}")]
    UnknownAead(String),

    #[error("require_strong_suite cannot be satisfied while attempt_strong_suite is false")]
    StrictModeWithoutAttempt,
}

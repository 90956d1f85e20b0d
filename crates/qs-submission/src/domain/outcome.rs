//! Submission outcomes: wire objects, response classification and the report
//! handed back to the caller.

use crate::domain::identifier::RequestIdentifier;
use crate::domain::policy::DowngradeEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw collector response as returned by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// JSON body (`Value::Null` when absent or unparsable)
    pub body: Value,
}

impl TransportResponse {
    /// Build a response from a status and JSON body.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Recognised fields of a collector response body. All optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResponseBody {
    pub ok: Option<bool>,
    pub id: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
    /// Server marks a 2xx failure as transient
    pub retryable: Option<bool>,
}

impl ResponseBody {
    /// Lenient parse: anything that is not a matching object reads as empty.
    pub fn from_value(body: &Value) -> Self {
        serde_json::from_value(body.clone()).unwrap_or_default()
    }
}

/// Server-reported success status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitStatus {
    /// First time the collector stored this identifier
    Created,
    /// The collector already had this identifier
    Duplicate,
}

impl SubmitStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            SubmitStatus::Created => "created",
            SubmitStatus::Duplicate => "duplicate",
        }
    }
}

/// Classified transport response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx with `ok: true`
    Accepted {
        status: SubmitStatus,
        id: Option<RequestIdentifier>,
    },
    /// 2xx with `ok: false`
    Refused { message: String, retryable: bool },
    /// 4xx
    ClientError { status: u16, message: String },
    /// 5xx, any other status, or a 2xx without a recognizable `ok` flag
    ServerError { status: u16 },
}

const DEFAULT_REFUSED_MESSAGE: &str = "The server rejected the submission.";
const DEFAULT_CLIENT_ERROR_MESSAGE: &str = "The submission was rejected.";

/// Classify a collector response by status class and body flags.
pub fn classify_response(response: &TransportResponse) -> ResponseClass {
    let body = ResponseBody::from_value(&response.body);
    match response.status {
        200..=299 if body.ok == Some(true) => ResponseClass::Accepted {
            status: match body.status.as_deref() {
                Some("duplicate") => SubmitStatus::Duplicate,
                _ => SubmitStatus::Created,
            },
            id: body.id.as_deref().and_then(RequestIdentifier::parse),
        },
        200..=299 if body.ok == Some(false) => ResponseClass::Refused {
            message: body
                .error
                .unwrap_or_else(|| DEFAULT_REFUSED_MESSAGE.to_string()),
            retryable: body.retryable == Some(true),
        },
        400..=499 => ResponseClass::ClientError {
            status: response.status,
            message: body
                .error
                .unwrap_or_else(|| DEFAULT_CLIENT_ERROR_MESSAGE.to_string()),
        },
        status => ResponseClass::ServerError { status },
    }
}

/// Outer object handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundSubmission {
    /// Protocol version tag
    pub v: String,
    /// Request identifier (64 lowercase hex)
    pub id: RequestIdentifier,
    /// Whether the strong suite sealed the envelope
    pub pqc_used: bool,
    /// JSON-encoded envelope
    pub encrypted: String,
}

/// Terminal value returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    Success {
        /// `None` only for a deflected (honeypot) submission
        id: Option<RequestIdentifier>,
        status: SubmitStatus,
    },
    Failure {
        /// Plain, user-facing text
        message: String,
    },
}

impl SubmitResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitResult::Success { .. })
    }

    /// Failure message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            SubmitResult::Failure { message } => Some(message),
            SubmitResult::Success { .. } => None,
        }
    }
}

/// Orchestrator states, in transition order, followed by the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Start,
    Canonicalized,
    Identified,
    RateChecked,
    CapabilityChecked,
    PolicyResolved,
    SizeGuarded,
    Pending,
    Transmitted,
    // Terminal
    Created,
    Duplicate,
    /// Honeypot tripped; nothing was sealed or sent
    Deflected,
    /// Rejected locally or by a 4xx; nothing will succeed by blind retry
    ClientRejected,
    /// 2xx whose body reported failure
    ServerRejected,
    ServerFailure,
    NetworkFailure,
}

impl SubmissionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SubmissionState::Created
                | SubmissionState::Duplicate
                | SubmissionState::Deflected
                | SubmissionState::ClientRejected
                | SubmissionState::ServerRejected
                | SubmissionState::ServerFailure
                | SubmissionState::NetworkFailure
        )
    }
}

/// Metrics label for a finished submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionOutcome {
    Created,
    Duplicate,
    Deflected,
    /// Local policy gate
    Rejected,
    /// Canonicalization, builder or encoding failure
    Failed,
    /// 2xx with a failure body
    Refused,
    ClientError,
    ServerError,
    NetworkError,
}

impl SubmissionOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            SubmissionOutcome::Created => "created",
            SubmissionOutcome::Duplicate => "duplicate",
            SubmissionOutcome::Deflected => "deflected",
            SubmissionOutcome::Rejected => "rejected",
            SubmissionOutcome::Failed => "failed",
            SubmissionOutcome::Refused => "refused",
            SubmissionOutcome::ClientError => "client_error",
            SubmissionOutcome::ServerError => "server_error",
            SubmissionOutcome::NetworkError => "network_error",
        }
    }
}

/// Everything a caller learns from one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReport {
    pub result: SubmitResult,
    /// Present only after a best-effort downgrade
    pub downgrade: Option<DowngradeEvent>,
    /// `None` when no envelope was sealed
    pub pqc_used: Option<bool>,
    /// Terminal state reached
    pub state: SubmissionState,
}

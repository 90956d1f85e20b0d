//! # Inbound Ports (Driving Ports / API)
//!
//! The API a form layer calls to submit a payload.

use crate::domain::outcome::SubmissionReport;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Primary secure-submission API.
///
/// Submissions are sequential: the pending record and the rate-limit window
/// are shared mutable state without cross-submission locking. Two racing
/// submissions leave only the later identifier pending (last write wins).
#[async_trait]
pub trait SecureSubmissionApi: Send + Sync {
    /// Canonicalize, seal and deliver `payload`.
    ///
    /// Never returns `Err`: every failure is a `SubmitResult::Failure` inside
    /// the report.
    async fn submit(&self, payload: Value) -> SubmissionReport;

    /// As [`SecureSubmissionApi::submit`], adding non-sensitive sender hints to
    /// the envelope metadata (merged over configured hints).
    async fn submit_with_hints(
        &self,
        payload: Value,
        hints: BTreeMap<String, String>,
    ) -> SubmissionReport;
}

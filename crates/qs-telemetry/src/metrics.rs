//! Prometheus metrics for secure submissions.
//!
//! All metrics follow the naming convention: `qs_<metric>_<unit>`
//!
//! | Metric | Labels |
//! |--------|--------|
//! | `qs_submissions_total` | `outcome` |
//! | `qs_envelopes_sealed_total` | `suite` |
//! | `qs_downgrades_total` | `reason` |
//! | `qs_rejections_total` | `kind` |

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use qs_submission::{DowngradeReason, MetricsRecorder, RejectionKind, SubmissionOutcome, Suite};

use crate::TelemetryError;

/// `MetricsRecorder` backed by a private Prometheus registry.
#[derive(Clone)]
pub struct PrometheusRecorder {
    registry: Registry,
    submissions: IntCounterVec,
    envelopes_sealed: IntCounterVec,
    downgrades: IntCounterVec,
    rejections: IntCounterVec,
}

fn counter(registry: &Registry, name: &str, help: &str, label: &str) -> Result<IntCounterVec, TelemetryError> {
    let vec = IntCounterVec::new(Opts::new(name, help), &[label])
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    registry
        .register(Box::new(vec.clone()))
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    Ok(vec)
}

impl PrometheusRecorder {
    /// Create a recorder with its own registry.
    pub fn new() -> Result<Self, TelemetryError> {
        Self::with_registry(Registry::new())
    }

    /// Register the submission counters on `registry`.
    pub fn with_registry(registry: Registry) -> Result<Self, TelemetryError> {
        Ok(Self {
            submissions: counter(
                &registry,
                "qs_submissions_total",
                "Finished submissions by outcome",
                "outcome",
            )?,
            envelopes_sealed: counter(
                &registry,
                "qs_envelopes_sealed_total",
                "Sealed envelopes by suite",
                "suite",
            )?,
            downgrades: counter(
                &registry,
                "qs_downgrades_total",
                "Best-effort downgrades to the classical suite by reason",
                "reason",
            )?,
            rejections: counter(
                &registry,
                "qs_rejections_total",
                "Local policy rejections by kind",
                "kind",
            )?,
            registry,
        })
    }

    /// Underlying registry, for exposition alongside other collectors.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode all metrics as Prometheus text format.
    pub fn gather_text(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }
}

impl MetricsRecorder for PrometheusRecorder {
    fn record_outcome(&self, outcome: SubmissionOutcome) {
        self.submissions.with_label_values(&[outcome.as_str()]).inc();
    }

    fn record_seal(&self, suite: Suite) {
        self.envelopes_sealed.with_label_values(&[suite.as_str()]).inc();
    }

    fn record_downgrade(&self, reason: DowngradeReason) {
        self.downgrades.with_label_values(&[reason.as_str()]).inc();
    }

    fn record_rejection(&self, kind: RejectionKind) {
        self.rejections.with_label_values(&[kind.as_str()]).inc();
    }
}

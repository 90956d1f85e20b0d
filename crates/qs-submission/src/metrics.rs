//! Metrics hooks for submission processing
//!
//! Provides instrumentation points for submission outcomes, seal suites,
//! downgrades and policy rejections.
//!
//! ## Usage
//!
//! ```ignore
//! use qs_submission::metrics::{Metrics, MetricsRecorder};
//!
//! let metrics = Arc::new(Metrics::new());
//! let service = SubmissionService::builder(config, canonicalizer, transport)
//!     .metrics(metrics.clone())
//!     .build()?;
//!
//! service.submit(payload).await;
//! assert_eq!(metrics.snapshot().submissions, 1);
//! ```

use crate::domain::envelope::Suite;
use crate::domain::outcome::SubmissionOutcome;
use crate::domain::policy::DowngradeReason;
use crate::error::RejectionKind;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for submissions
///
/// Thread-safe counters, one per label the recorder hooks can produce.
#[derive(Default)]
pub struct Metrics {
    /// Finished submissions of any outcome
    pub submissions: AtomicU64,
    /// Accepted as new by the collector
    pub created: AtomicU64,
    /// Accepted as already known
    pub duplicates: AtomicU64,
    /// Honeypot short-circuits
    pub deflected: AtomicU64,
    /// Local policy rejections
    pub rejected: AtomicU64,
    /// Canonicalization, builder or encoding failures
    pub failed: AtomicU64,
    /// 2xx responses reporting failure
    pub refused: AtomicU64,
    /// 4xx responses
    pub client_errors: AtomicU64,
    /// 5xx or unrecognised responses
    pub server_errors: AtomicU64,
    /// Transport errors
    pub network_errors: AtomicU64,
    /// Envelopes sealed with the hybrid suite
    pub hybrid_seals: AtomicU64,
    /// Envelopes sealed classically
    pub classical_seals: AtomicU64,
    /// Best-effort downgrades
    pub downgrades: AtomicU64,
    /// Strict-mode rejections
    pub strict_rejections: AtomicU64,
    /// Rate-limit denials
    pub rate_limited: AtomicU64,
    /// Size-guard rejections (either guard)
    pub oversize: AtomicU64,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished submission
    pub fn record_outcome(&self, outcome: SubmissionOutcome) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            SubmissionOutcome::Created => &self.created,
            SubmissionOutcome::Duplicate => &self.duplicates,
            SubmissionOutcome::Deflected => &self.deflected,
            SubmissionOutcome::Rejected => &self.rejected,
            SubmissionOutcome::Failed => &self.failed,
            SubmissionOutcome::Refused => &self.refused,
            SubmissionOutcome::ClientError => &self.client_errors,
            SubmissionOutcome::ServerError => &self.server_errors,
            SubmissionOutcome::NetworkError => &self.network_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sealed envelope
    pub fn record_seal(&self, suite: Suite) {
        match suite {
            Suite::Hybrid => self.hybrid_seals.fetch_add(1, Ordering::Relaxed),
            Suite::Classical => self.classical_seals.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record a downgrade. The reason is kept by label-aware recorders only.
    pub fn record_downgrade(&self, _reason: DowngradeReason) {
        self.downgrades.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a policy rejection
    pub fn record_rejection(&self, kind: RejectionKind) {
        match kind {
            RejectionKind::StrictMode => {
                self.strict_rejections.fetch_add(1, Ordering::Relaxed);
            }
            RejectionKind::RateLimited => {
                self.rate_limited.fetch_add(1, Ordering::Relaxed);
            }
            RejectionKind::PlaintextTooLarge | RejectionKind::EnvelopeTooLarge => {
                self.oversize.fetch_add(1, Ordering::Relaxed);
            }
            RejectionKind::CapabilityMissing => {}
        }
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submissions: self.submissions.load(Ordering::Relaxed),
            created: self.created.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            deflected: self.deflected.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            refused: self.refused.load(Ordering::Relaxed),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            network_errors: self.network_errors.load(Ordering::Relaxed),
            hybrid_seals: self.hybrid_seals.load(Ordering::Relaxed),
            classical_seals: self.classical_seals.load(Ordering::Relaxed),
            downgrades: self.downgrades.load(Ordering::Relaxed),
            strict_rejections: self.strict_rejections.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            oversize: self.oversize.load(Ordering::Relaxed),
        }
    }

    /// Share of sealed envelopes that used the hybrid suite
    pub fn hybrid_ratio(&self) -> f64 {
        let hybrid = self.hybrid_seals.load(Ordering::Relaxed);
        let total = hybrid + self.classical_seals.load(Ordering::Relaxed);
        if total > 0 {
            hybrid as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        for counter in [
            &self.submissions,
            &self.created,
            &self.duplicates,
            &self.deflected,
            &self.rejected,
            &self.failed,
            &self.refused,
            &self.client_errors,
            &self.server_errors,
            &self.network_errors,
            &self.hybrid_seals,
            &self.classical_seals,
            &self.downgrades,
            &self.strict_rejections,
            &self.rate_limited,
            &self.oversize,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub submissions: u64,
    pub created: u64,
    pub duplicates: u64,
    pub deflected: u64,
    pub rejected: u64,
    pub failed: u64,
    pub refused: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub network_errors: u64,
    pub hybrid_seals: u64,
    pub classical_seals: u64,
    pub downgrades: u64,
    pub strict_rejections: u64,
    pub rate_limited: u64,
    pub oversize: u64,
}

/// Trait for custom metrics recording implementations
///
/// Implement this trait to integrate with external metrics systems
/// such as Prometheus.
pub trait MetricsRecorder: Send + Sync {
    /// Record a finished submission
    fn record_outcome(&self, outcome: SubmissionOutcome);

    /// Record a sealed envelope
    fn record_seal(&self, suite: Suite);

    /// Record a best-effort downgrade
    fn record_downgrade(&self, reason: DowngradeReason);

    /// Record a policy rejection
    fn record_rejection(&self, kind: RejectionKind);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_outcome(&self, _: SubmissionOutcome) {}
    fn record_seal(&self, _: Suite) {}
    fn record_downgrade(&self, _: DowngradeReason) {}
    fn record_rejection(&self, _: RejectionKind) {}
}

impl MetricsRecorder for Metrics {
    fn record_outcome(&self, outcome: SubmissionOutcome) {
        Metrics::record_outcome(self, outcome);
    }

    fn record_seal(&self, suite: Suite) {
        Metrics::record_seal(self, suite);
    }

    fn record_downgrade(&self, reason: DowngradeReason) {
        Metrics::record_downgrade(self, reason);
    }

    fn record_rejection(&self, kind: RejectionKind) {
        Metrics::record_rejection(self, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let snapshot = Metrics::new().snapshot();
        assert_eq!(snapshot, MetricsSnapshot::default());
    }

    #[test]
    fn test_record_outcomes() {
        let metrics = Metrics::new();

        metrics.record_outcome(SubmissionOutcome::Created);
        metrics.record_outcome(SubmissionOutcome::Duplicate);
        metrics.record_outcome(SubmissionOutcome::NetworkError);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.submissions, 3);
        assert_eq!(snapshot.created, 1);
        assert_eq!(snapshot.duplicates, 1);
        assert_eq!(snapshot.network_errors, 1);
    }

    #[test]
    fn test_hybrid_ratio() {
        let metrics = Metrics::new();
        assert_eq!(metrics.hybrid_ratio(), 0.0);

        for _ in 0..3 {
            metrics.record_seal(Suite::Hybrid);
        }
        metrics.record_seal(Suite::Classical);
        metrics.record_downgrade(DowngradeReason::ModuleBlocked);

        assert!((metrics.hybrid_ratio() - 0.75).abs() < f64::EPSILON);
        assert_eq!(metrics.snapshot().downgrades, 1);
    }

    #[test]
    fn test_rejections() {
        let metrics = Metrics::new();
        metrics.record_rejection(RejectionKind::StrictMode);
        metrics.record_rejection(RejectionKind::PlaintextTooLarge);
        metrics.record_rejection(RejectionKind::EnvelopeTooLarge);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.strict_rejections, 1);
        assert_eq!(snapshot.oversize, 2);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_outcome(SubmissionOutcome::Created);
        metrics.record_seal(Suite::Hybrid);
        metrics.record_rejection(RejectionKind::RateLimited);

        metrics.reset();

        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_noop_recorder() {
        let recorder: &dyn MetricsRecorder = &NoOpMetrics;
        recorder.record_outcome(SubmissionOutcome::Created);
        recorder.record_seal(Suite::Classical);
    }
}

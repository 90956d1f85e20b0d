//! # Integration Test Flows
//!
//! End-to-end submissions through `SubmissionService` into the mock collector,
//! which opens every envelope with the recipient keys.
//!
//! ## Flows Tested:
//!
//! 1. **Hybrid**: ML-KEM-768 + X25519 envelope opened by the collector
//! 2. **Downgrade**: collector publishes no strong key, classical envelope + event
//! 3. **Lost response**: retry of the pending payload lands as a duplicate
//! 4. **Strict mode**: nothing reaches the collector
//! 5. **Shared context**: capability promotion is visible across services
//! 6. **Telemetry**: Prometheus recorder wired into the service

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use qs_submission::{
        DisabledStrongSuiteLoader, DowngradeReason, FormCanonicalizer, InMemoryScopedStorage,
        SecureSubmissionApi, SubmissionConfig, SubmissionContext, SubmissionService,
        SubmissionState, SubmitResult, SubmitStatus, Suite,
    };
    use qs_telemetry::PrometheusRecorder;
    use serde_json::json;

    use crate::integration::collector::{Fault, MockCollector};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn config_for(collector: &MockCollector) -> SubmissionConfig {
        let toml = format!(
            r#"
endpoint = "https://collector.example/api/submit"
require_strong_suite = false

[public_keys]
classical = "{}"
{}

[rate_limit]
max = 3
window_ms = 60000

[sender_hints]
form = "contact"
"#,
            collector.classical_public_hex(),
            collector
                .strong_public_hex()
                .map(|k| format!("strong = \"{k}\""))
                .unwrap_or_default(),
        );
        SubmissionConfig::from_toml_str(&toml).unwrap()
    }

    fn service_for(collector: &Arc<MockCollector>, config: SubmissionConfig) -> SubmissionService {
        SubmissionService::builder(
            config,
            Arc::new(FormCanonicalizer::default()),
            collector.clone(),
        )
        .storage(Arc::new(InMemoryScopedStorage::new()))
        .build()
        .unwrap()
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_hybrid_submission_is_opened_by_collector() {
        let collector = Arc::new(MockCollector::new(true));
        let service = service_for(&collector, config_for(&collector));

        let report = service
            .submit(json!({"email": " Ada@Example.org ", "message": "Hello\r\nworld"}))
            .await;

        assert_eq!(report.state, SubmissionState::Created);
        assert_eq!(report.pqc_used, Some(true));
        assert!(report.downgrade.is_none());

        let stored = collector.stored();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].suite, "hybrid");
        assert!(stored[0].pqc_used);
        assert_eq!(
            stored[0].payload,
            json!({"email": "ada@example.org", "message": "Hello\nworld"})
        );
        assert_eq!(
            report.result,
            SubmitResult::Success {
                id: Some(stored[0].id.clone()),
                status: SubmitStatus::Created
            }
        );
    }

    #[tokio::test]
    async fn test_collector_without_strong_key_gets_classical_envelope() {
        let collector = Arc::new(MockCollector::new(false));
        let service = service_for(&collector, config_for(&collector));

        let report = service.submit(json!({"message": "classical only"})).await;

        assert_eq!(report.state, SubmissionState::Created);
        assert_eq!(report.pqc_used, Some(false));
        let event = report.downgrade.expect("downgrade event");
        assert_eq!(event.reason, DowngradeReason::SuiteUnavailable);
        assert_eq!(event.suite_used, Suite::Classical);
        assert_eq!(event.hints.get("form").map(String::as_str), Some("contact"));

        let stored = collector.stored();
        assert_eq!(stored[0].suite, "classical");
        assert!(!stored[0].pqc_used);
        // The module is never loaded when there is no key to encapsulate to.
        assert!(!service.context().strong_suite.is_attempted());
    }

    #[tokio::test]
    async fn test_lost_response_retry_is_duplicate() {
        let collector = Arc::new(MockCollector::new(true));
        let service = service_for(&collector, config_for(&collector));
        let payload = json!({"email": "a@b.com", "note": "x"});

        collector.inject(Fault::LoseResponse);
        let first = service.submit(payload.clone()).await;
        assert_eq!(first.state, SubmissionState::NetworkFailure);
        assert!(service.pending_identifier().is_some());
        assert_eq!(collector.stored().len(), 1);

        let retry = service.submit(payload).await;
        assert_eq!(retry.state, SubmissionState::Duplicate);
        assert!(service.pending_identifier().is_none());
        assert_eq!(collector.stored().len(), 1);
        assert_eq!(collector.request_count(), 2);
        // The retry consumed no rate-limit quota.
        assert!(service.context().rate_limiter.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_then_success() {
        let collector = Arc::new(MockCollector::new(true));
        let service = service_for(&collector, config_for(&collector));

        collector.inject(Fault::Unreachable);
        let first = service.submit(json!({"a": 1})).await;
        assert_eq!(first.state, SubmissionState::NetworkFailure);
        assert!(collector.stored().is_empty());

        let second = service.submit(json!({"a": 1})).await;
        assert_eq!(second.state, SubmissionState::Created);
        assert_eq!(collector.stored().len(), 1);
    }

    #[tokio::test]
    async fn test_server_validation_error_clears_pending() {
        let collector = Arc::new(MockCollector::new(true));
        let service = service_for(&collector, config_for(&collector));

        collector.inject(Fault::Respond(
            400,
            json!({"ok": false, "error": "Message is required"}),
        ));
        let report = service.submit(json!({"email": "a@b.com"})).await;

        assert_eq!(report.state, SubmissionState::ClientRejected);
        assert_eq!(report.result.message(), Some("Message is required"));
        assert!(service.pending_identifier().is_none());
    }

    #[tokio::test]
    async fn test_strict_mode_never_reaches_collector() {
        let collector = Arc::new(MockCollector::new(true));
        let mut config = config_for(&collector);
        config.require_strong_suite = true;

        let service = SubmissionService::builder(
            config,
            Arc::new(FormCanonicalizer::default()),
            collector.clone(),
        )
        .strong_suite_loader(Arc::new(DisabledStrongSuiteLoader::new(
            "Refused to load module: violates Content Security Policy",
        )))
        .build()
        .unwrap();

        let report = service.submit(json!({"message": "secret"})).await;

        assert_eq!(report.state, SubmissionState::ClientRejected);
        assert!(report.downgrade.is_none());
        assert!(!report.result.is_success());
        assert_eq!(collector.request_count(), 0);
        assert!(service.pending_identifier().is_none());
    }

    #[tokio::test]
    async fn test_shared_context_across_services() {
        let collector = Arc::new(MockCollector::new(true));
        let context = Arc::new(SubmissionContext::with_defaults());

        let build = || {
            SubmissionService::builder(
                config_for(&collector),
                Arc::new(FormCanonicalizer::default()),
                collector.clone(),
            )
            .context(context.clone())
            .build()
            .unwrap()
        };
        let first = build();
        let second = build();

        first.submit(json!({"n": 1})).await;
        assert!(second.context().capability.check(false).strong_suite_usable);
        assert_eq!(second.context().rate_limiter.len(), 1);

        context.reset();
        assert!(!first.context().capability.is_checked());
        assert!(first.context().rate_limiter.is_empty());
    }

    #[tokio::test]
    async fn test_honeypot_is_deflected_before_collector() {
        let collector = Arc::new(MockCollector::new(true));
        let service = service_for(&collector, config_for(&collector));

        let report = service
            .submit(json!({"email": "bot@example.org", "website": "https://spam.example"}))
            .await;

        assert_eq!(report.state, SubmissionState::Deflected);
        assert!(report.result.is_success());
        assert_eq!(collector.request_count(), 0);
    }

    #[tokio::test]
    async fn test_prometheus_recorder_counts_flow() {
        let collector = Arc::new(MockCollector::new(false));
        let recorder = Arc::new(PrometheusRecorder::new().unwrap());
        let service = SubmissionService::builder(
            config_for(&collector),
            Arc::new(FormCanonicalizer::default()),
            collector.clone(),
        )
        .metrics(recorder.clone())
        .build()
        .unwrap();

        service.submit(json!({"a": 1})).await;
        service.submit(json!({"a": 1, "website": "x"})).await;

        let text = recorder.gather_text().unwrap();
        assert!(text.contains("qs_submissions_total{outcome=\"created\"} 1"));
        assert!(text.contains("qs_submissions_total{outcome=\"deflected\"} 1"));
        assert!(text.contains("qs_envelopes_sealed_total{suite=\"classical\"} 1"));
        assert!(text.contains("qs_downgrades_total{reason=\"suite_unavailable\"} 1"));
    }
}

//! Submission Service
//!
//! Sequences canonicalization, identification, rate limiting, capability,
//! size guards, seal policy, pending tracking and transport into one
//! submission.
//!
//! ## State Machine
//!
//! ```text
//! Start -> Canonicalized -> Identified -> RateChecked -> CapabilityChecked
//!       -> SizeGuarded -> PolicyResolved -> Pending -> Transmitted
//!       -> {Created | Duplicate | ServerRejected | ClientRejected | ServerFailure | NetworkFailure}
//! Start -> Deflected                                           (honeypot)
//! ```
//!
//! Every policy gate runs before the pending record is written, and the
//! pending record is written before the transport is called.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapters::{BuiltinStrongSuiteLoader, HostPrimitiveProbe, InMemoryScopedStorage};
use crate::domain::{
    classify_response, generate_identifier, CapabilityDetector, DowngradeEvent, IdempotencyStore,
    OutboundSubmission, PolicyEngine, PolicyOutcome, PolicySettings, RateLimiter,
    RecipientPublicKeys, RequestIdentifier, ResponseClass, SealContext, StrongSuiteSlot,
    SubmissionConfig, SubmissionOutcome, SubmissionReport, SubmissionState, SubmitResult,
    SubmitStatus,
};
use crate::error::{ConfigError, SubmitError};
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{
    Canonicalizer, PrimitiveProbe, ScopedStorage, SecureSubmissionApi, StrongSuiteLoader,
    SystemTimeSource, TimeSource, Transport,
};
use shared_crypto::Cipher;

/// Process-scoped mutable state shared by submissions.
///
/// Passed explicitly instead of living in statics; `reset()` restores a fresh
/// process for test isolation.
pub struct SubmissionContext {
    pub capability: CapabilityDetector,
    pub rate_limiter: RateLimiter,
    pub strong_suite: StrongSuiteSlot,
}

impl SubmissionContext {
    pub fn new(
        probe: Arc<dyn PrimitiveProbe>,
        loader: Arc<dyn StrongSuiteLoader>,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            capability: CapabilityDetector::new(probe),
            rate_limiter: RateLimiter::new(time_source),
            strong_suite: StrongSuiteSlot::new(loader),
        }
    }

    /// Host self-test probe, built-in ML-KEM-768 loader, system clock.
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(HostPrimitiveProbe),
            Arc::new(BuiltinStrongSuiteLoader),
            Arc::new(SystemTimeSource),
        )
    }

    /// Forget the capability cache, the rate-limit timeline and the module load.
    pub fn reset(&self) {
        self.capability.reset();
        self.rate_limiter.reset();
        self.strong_suite.reset();
    }
}

/// Builder for [`SubmissionService`].
///
/// Canonicalizer and transport are required; every other collaborator has a
/// default.
pub struct SubmissionServiceBuilder {
    config: SubmissionConfig,
    canonicalizer: Arc<dyn Canonicalizer>,
    transport: Arc<dyn Transport>,
    storage: Option<Arc<dyn ScopedStorage>>,
    time_source: Option<Arc<dyn TimeSource>>,
    probe: Option<Arc<dyn PrimitiveProbe>>,
    loader: Option<Arc<dyn StrongSuiteLoader>>,
    context: Option<Arc<SubmissionContext>>,
    metrics: Option<Arc<dyn MetricsRecorder>>,
}

impl SubmissionServiceBuilder {
    pub fn storage(mut self, storage: Arc<dyn ScopedStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = Some(time_source);
        self
    }

    /// Capability probe. Ignored when a context is supplied.
    pub fn probe(mut self, probe: Arc<dyn PrimitiveProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Strong-suite loader. Ignored when a context is supplied.
    pub fn strong_suite_loader(mut self, loader: Arc<dyn StrongSuiteLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Share process-scoped state with other services.
    pub fn context(mut self, context: Arc<SubmissionContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate the config and assemble the service.
    pub fn build(self) -> Result<SubmissionService, ConfigError> {
        self.config.validate()?;
        let keys = self.config.recipient_keys()?;
        let cipher = self.config.cipher()?;

        let time_source = self
            .time_source
            .unwrap_or_else(|| Arc::new(SystemTimeSource));
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(InMemoryScopedStorage::new()));
        let context = match self.context {
            Some(context) => context,
            None => Arc::new(SubmissionContext::new(
                self.probe.unwrap_or_else(|| Arc::new(HostPrimitiveProbe)),
                self.loader
                    .unwrap_or_else(|| Arc::new(BuiltinStrongSuiteLoader)),
                time_source.clone(),
            )),
        };

        Ok(SubmissionService {
            keys,
            cipher,
            canonicalizer: self.canonicalizer,
            transport: self.transport,
            idempotency: IdempotencyStore::new(storage, time_source.clone()),
            context,
            time_source,
            metrics: self.metrics.unwrap_or_else(|| Arc::new(NoOpMetrics)),
            config: self.config,
        })
    }
}

/// Secure-submission orchestrator.
///
/// Implements the `SecureSubmissionApi` port using injected collaborators.
pub struct SubmissionService {
    config: SubmissionConfig,
    keys: RecipientPublicKeys,
    cipher: Cipher,
    canonicalizer: Arc<dyn Canonicalizer>,
    transport: Arc<dyn Transport>,
    idempotency: IdempotencyStore,
    context: Arc<SubmissionContext>,
    time_source: Arc<dyn TimeSource>,
    metrics: Arc<dyn MetricsRecorder>,
}

/// What the report carries besides the result.
#[derive(Default)]
struct Trace {
    downgrade: Option<DowngradeEvent>,
    pqc_used: Option<bool>,
}

impl SubmissionService {
    /// Start building a service.
    pub fn builder(
        config: SubmissionConfig,
        canonicalizer: Arc<dyn Canonicalizer>,
        transport: Arc<dyn Transport>,
    ) -> SubmissionServiceBuilder {
        SubmissionServiceBuilder {
            config,
            canonicalizer,
            transport,
            storage: None,
            time_source: None,
            probe: None,
            loader: None,
            context: None,
            metrics: None,
        }
    }

    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    /// Process-scoped state used by this service.
    pub fn context(&self) -> &Arc<SubmissionContext> {
        &self.context
    }

    /// Identifier currently pending, if any.
    pub fn pending_identifier(&self) -> Option<RequestIdentifier> {
        self.idempotency
            .get_pending(&self.config.storage_key, self.config.pending_ttl_ms)
    }

    fn honeypot_tripped(&self, payload: &Value) -> bool {
        let Some(field) = self.config.honeypot_field.as_deref() else {
            return false;
        };
        match payload.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    fn policy_settings(&self) -> PolicySettings {
        PolicySettings {
            attempt_strong_suite: self.config.attempt_strong_suite,
            require_strong_suite: self.config.require_strong_suite,
            debug_downgrade: self.config.debug_downgrade,
        }
    }

    fn finish(
        &self,
        state: SubmissionState,
        result: SubmitResult,
        outcome: SubmissionOutcome,
        trace: Trace,
    ) -> SubmissionReport {
        self.metrics.record_outcome(outcome);
        SubmissionReport {
            result,
            downgrade: trace.downgrade,
            pqc_used: trace.pqc_used,
            state,
        }
    }

    fn fail(
        &self,
        state: SubmissionState,
        error: SubmitError,
        outcome: SubmissionOutcome,
        trace: Trace,
    ) -> SubmissionReport {
        if let Some(kind) = error.rejection_kind() {
            self.metrics.record_rejection(kind);
        }
        warn!(state = ?state, outcome = outcome.as_str(), error = %error, "Submission failed");
        self.finish(
            state,
            SubmitResult::Failure {
                message: error.to_string(),
            },
            outcome,
            trace,
        )
    }

    fn reject(&self, error: SubmitError, trace: Trace) -> SubmissionReport {
        self.fail(
            SubmissionState::ClientRejected,
            error,
            SubmissionOutcome::Rejected,
            trace,
        )
    }

    async fn run(&self, mut payload: Value, extra_hints: BTreeMap<String, String>) -> SubmissionReport {
        debug!(state = ?SubmissionState::Start, "Submission started");

        if self.honeypot_tripped(&payload) {
            info!("Honeypot field set; deflecting submission");
            return self.finish(
                SubmissionState::Deflected,
                SubmitResult::Success {
                    id: None,
                    status: SubmitStatus::Created,
                },
                SubmissionOutcome::Deflected,
                Trace::default(),
            );
        }
        if let (Some(field), Some(map)) = (&self.config.honeypot_field, payload.as_object_mut()) {
            map.remove(field);
        }

        let canonical = match self.canonicalizer.canonicalize(&payload) {
            Ok(canonical) => canonical,
            Err(e) => {
                return self.fail(
                    SubmissionState::ClientRejected,
                    SubmitError::Canonicalization(e.to_string()),
                    SubmissionOutcome::Failed,
                    Trace::default(),
                )
            }
        };
        debug!(state = ?SubmissionState::Canonicalized, "Payload canonicalized");

        let id = generate_identifier(&canonical);
        debug!(state = ?SubmissionState::Identified, id = %id, "Identifier computed");

        let key = self.config.storage_key.as_str();
        let is_retry = self
            .idempotency
            .is_retry(key, self.config.pending_ttl_ms, &id);
        if !self
            .context
            .rate_limiter
            .admit(&self.config.rate_limit, is_retry)
        {
            return self.reject(SubmitError::RateLimited, Trace::default());
        }
        debug!(state = ?SubmissionState::RateChecked, id = %id, is_retry, "Rate limit passed");

        let capability = self.context.capability.check(false);
        if !capability.available {
            let diagnostic = capability
                .diagnostic
                .unwrap_or_else(|| "cryptographic primitives unavailable".to_string());
            return self.reject(SubmitError::CapabilityMissing(diagnostic), Trace::default());
        }
        debug!(
            state = ?SubmissionState::CapabilityChecked,
            strong_suite_usable = capability.strong_suite_usable,
            "Capability available"
        );

        let plaintext = canonical.to_canonical_bytes();
        let max = self.config.max_plaintext_bytes;
        if plaintext.len() > max {
            return self.reject(
                SubmitError::PlaintextTooLarge {
                    size: plaintext.len(),
                    max,
                },
                Trace::default(),
            );
        }
        debug!(state = ?SubmissionState::SizeGuarded, size = plaintext.len(), max, "Plaintext within limit");

        let mut hints = self.config.sender_hints.clone();
        hints.extend(extra_hints);
        let seal_ctx = SealContext {
            version: self.config.version.clone(),
            cipher: self.cipher,
            created_at: self.time_source.now(),
            hints,
        };

        let engine = PolicyEngine {
            settings: self.policy_settings(),
            capability: &self.context.capability,
            strong_suite: &self.context.strong_suite,
        };
        let (envelope, trace) = match engine.resolve(&plaintext, &self.keys, &seal_ctx).await {
            Ok(PolicyOutcome::Sealed {
                envelope,
                pqc_used,
                downgrade,
            }) => {
                self.metrics.record_seal(envelope.suite);
                if let Some(event) = &downgrade {
                    self.metrics.record_downgrade(event.reason);
                }
                let trace = Trace {
                    downgrade,
                    pqc_used: Some(pqc_used),
                };
                (envelope, trace)
            }
            Ok(PolicyOutcome::Rejected { reason }) => {
                debug!(reason = reason.as_str(), "Strict mode rejection");
                return self.reject(SubmitError::StrictModeUnavailable, Trace::default());
            }
            Err(e) => {
                return self.fail(
                    SubmissionState::ClientRejected,
                    SubmitError::Builder(e),
                    SubmissionOutcome::Failed,
                    Trace::default(),
                )
            }
        };
        debug!(
            state = ?SubmissionState::PolicyResolved,
            id = %id,
            suite = envelope.suite.as_str(),
            "Envelope sealed"
        );

        let body = match envelope.to_json().and_then(|encrypted| {
            let outbound = OutboundSubmission {
                v: self.config.version.clone(),
                id: id.clone(),
                pqc_used: trace.pqc_used == Some(true),
                encrypted,
            };
            serde_json::to_string(&outbound)
                .map_err(|e| crate::error::SealError::MalformedEnvelope(e.to_string()))
        }) {
            Ok(body) => body,
            Err(e) => {
                return self.fail(
                    SubmissionState::ClientRejected,
                    SubmitError::Serialization(e.message()),
                    SubmissionOutcome::Failed,
                    trace,
                )
            }
        };

        let max = self.config.max_envelope_bytes;
        if body.len() > max {
            return self.reject(
                SubmitError::EnvelopeTooLarge {
                    size: body.len(),
                    max,
                },
                trace,
            );
        }

        self.idempotency.set_pending(key, &id);
        debug!(state = ?SubmissionState::Pending, id = %id, size = body.len(), "Pending record written");

        let response = match self.transport.send(&self.config.endpoint, body).await {
            Ok(response) => response,
            Err(e) => {
                // Pending stays so the same payload can be retried.
                return self.fail(
                    SubmissionState::NetworkFailure,
                    SubmitError::Network(e.to_string()),
                    SubmissionOutcome::NetworkError,
                    trace,
                );
            }
        };
        debug!(state = ?SubmissionState::Transmitted, id = %id, status = response.status, "Response received");

        match classify_response(&response) {
            ResponseClass::Accepted { status, id: echoed } => {
                self.idempotency.clear(key);
                if !is_retry {
                    self.context.rate_limiter.record(&self.config.rate_limit);
                }
                let (state, outcome) = match status {
                    SubmitStatus::Created => (SubmissionState::Created, SubmissionOutcome::Created),
                    SubmitStatus::Duplicate => {
                        (SubmissionState::Duplicate, SubmissionOutcome::Duplicate)
                    }
                };
                let id = echoed.unwrap_or(id);
                info!(id = %id, status = status.as_str(), pqc_used = ?trace.pqc_used, "Submission accepted");
                self.finish(
                    state,
                    SubmitResult::Success {
                        id: Some(id),
                        status,
                    },
                    outcome,
                    trace,
                )
            }
            ResponseClass::Refused { message, retryable } => {
                if !retryable {
                    self.idempotency.clear(key);
                }
                self.fail(
                    SubmissionState::ServerRejected,
                    SubmitError::ServerRejected(message),
                    SubmissionOutcome::Refused,
                    trace,
                )
            }
            ResponseClass::ClientError { status, message } => {
                self.idempotency.clear(key);
                self.fail(
                    SubmissionState::ClientRejected,
                    SubmitError::ClientRejected { status, message },
                    SubmissionOutcome::ClientError,
                    trace,
                )
            }
            ResponseClass::ServerError { status } => self.fail(
                SubmissionState::ServerFailure,
                SubmitError::ServerFailure { status },
                SubmissionOutcome::ServerError,
                trace,
            ),
        }
    }
}

#[async_trait]
impl SecureSubmissionApi for SubmissionService {
    async fn submit(&self, payload: Value) -> SubmissionReport {
        self.run(payload, BTreeMap::new()).await
    }

    async fn submit_with_hints(
        &self,
        payload: Value,
        hints: BTreeMap<String, String>,
    ) -> SubmissionReport {
        self.run(payload, hints).await
    }
}

//! # Policy / Decision Engine
//!
//! Decides between the strong (hybrid) and classical seal.
//!
//! ## State Machine
//!
//! ```text
//! NotAttempted -> AttemptingStrong -> Sealed(strong)
//!                                  -> Downgrading -> Sealed(classical)
//!                                  -> Rejected
//! NotAttempted -> Sealed(classical)        (attempt disabled)
//! ```
//!
//! Strict mode fails closed: no envelope, no downgrade event. Best-effort mode
//! emits exactly one [`DowngradeEvent`] and seals classically.

use crate::domain::capability::CapabilityDetector;
use crate::domain::config::RecipientPublicKeys;
use crate::domain::envelope::{
    check_classical_key, seal_classical, seal_hybrid, Envelope, SealContext, Suite,
};
use crate::domain::strong_suite::StrongSuiteSlot;
use crate::error::SealError;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Failure text used when no strong-suite recipient key is configured.
pub const MISSING_STRONG_KEY_MESSAGE: &str = "strong-suite recipient key unavailable";

/// Closed set of downgrade causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DowngradeReason {
    /// A content or execution policy blocked the module
    ModuleBlocked,
    /// The module failed to import or load
    ModuleLoadFailed,
    /// The suite is not available in this environment
    SuiteUnavailable,
    /// The module loaded but encapsulation or wrapping failed
    EncapsulationFailed,
    Unknown,
}

impl DowngradeReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            DowngradeReason::ModuleBlocked => "module_blocked",
            DowngradeReason::ModuleLoadFailed => "module_load_failed",
            DowngradeReason::SuiteUnavailable => "suite_unavailable",
            DowngradeReason::EncapsulationFailed => "encapsulation_failed",
            DowngradeReason::Unknown => "unknown",
        }
    }
}

const BLOCKED_HINTS: &[&str] = &[
    "content security",
    "content-security",
    "csp",
    "policy",
    "blocked",
    "refused",
];
const LOAD_HINTS: &[&str] = &["import", "load", "fetch", "module"];
const UNAVAILABLE_HINTS: &[&str] = &["unavailable", "not available", "unsupported", "not supported"];
const ENCRYPTION_HINTS: &[&str] = &["encaps", "encrypt", "kem", "wrap", "cipher"];

/// Classify a raw failure message. Hint groups are checked in priority order.
pub fn classify_failure(message: &str) -> DowngradeReason {
    let lower = message.to_lowercase();
    let matches = |hints: &[&str]| hints.iter().any(|hint| lower.contains(hint));

    if matches(BLOCKED_HINTS) {
        DowngradeReason::ModuleBlocked
    } else if matches(LOAD_HINTS) {
        DowngradeReason::ModuleLoadFailed
    } else if matches(UNAVAILABLE_HINTS) {
        DowngradeReason::SuiteUnavailable
    } else if matches(ENCRYPTION_HINTS) {
        DowngradeReason::EncapsulationFailed
    } else {
        DowngradeReason::Unknown
    }
}

/// Informational event emitted alongside a best-effort classical seal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DowngradeEvent {
    pub reason: DowngradeReason,
    /// Suite actually used
    pub suite_used: Suite,
    /// Non-sensitive context (sender hints plus the failed phase)
    pub hints: BTreeMap<String, String>,
    /// Raw failure text; only with `debug_downgrade`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_message: Option<String>,
}

/// Policy engine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyState {
    NotAttempted,
    AttemptingStrong,
    Downgrading,
    SealedStrong,
    SealedClassical,
    Rejected,
}

/// Policy switches taken from the submission config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicySettings {
    pub attempt_strong_suite: bool,
    pub require_strong_suite: bool,
    pub debug_downgrade: bool,
}

/// Result of resolving the seal policy.
#[derive(Debug)]
pub enum PolicyOutcome {
    Sealed {
        envelope: Envelope,
        pqc_used: bool,
        downgrade: Option<DowngradeEvent>,
    },
    /// Strict mode and the strong suite could not be used.
    Rejected { reason: DowngradeReason },
}

impl PolicyOutcome {
    /// Terminal policy state for this outcome.
    pub fn state(&self) -> PolicyState {
        match self {
            PolicyOutcome::Sealed { pqc_used: true, .. } => PolicyState::SealedStrong,
            PolicyOutcome::Sealed { .. } => PolicyState::SealedClassical,
            PolicyOutcome::Rejected { .. } => PolicyState::Rejected,
        }
    }
}

/// Where the strong attempt failed.
#[derive(Debug, Clone, Copy)]
enum StrongPhase {
    Key,
    Load,
    Seal,
}

impl StrongPhase {
    fn as_str(self) -> &'static str {
        match self {
            StrongPhase::Key => "key",
            StrongPhase::Load => "load",
            StrongPhase::Seal => "seal",
        }
    }
}

/// Borrowed view over the process-scoped state the policy needs.
pub struct PolicyEngine<'a> {
    pub settings: PolicySettings,
    pub capability: &'a CapabilityDetector,
    pub strong_suite: &'a StrongSuiteSlot,
}

impl PolicyEngine<'_> {
    /// Seal `plaintext` under the configured policy.
    ///
    /// # Errors
    ///
    /// Only classical-seal failures (malformed or low-order recipient key,
    /// primitive failure), in strict mode too. Strong-suite failures become a
    /// downgrade or a rejection.
    pub async fn resolve(
        &self,
        plaintext: &[u8],
        keys: &RecipientPublicKeys,
        ctx: &SealContext,
    ) -> Result<PolicyOutcome, SealError> {
        debug!(state = ?PolicyState::NotAttempted, "Resolving seal policy");

        if !self.settings.attempt_strong_suite {
            if self.settings.require_strong_suite {
                warn!("Strict mode with the strong suite disabled; rejecting");
                return Ok(PolicyOutcome::Rejected {
                    reason: DowngradeReason::SuiteUnavailable,
                });
            }
            let envelope = seal_classical(plaintext, &keys.classical, ctx)?;
            debug!(state = ?PolicyState::SealedClassical, "Strong suite not attempted");
            return Ok(PolicyOutcome::Sealed {
                envelope,
                pqc_used: false,
                downgrade: None,
            });
        }

        // The hybrid seal runs the classical half first; a bad classical key
        // must not read as a strong-suite failure.
        check_classical_key(&keys.classical)?;

        debug!(state = ?PolicyState::AttemptingStrong, "Attempting strong suite");
        let (phase, failure) = match self.attempt_strong(plaintext, keys, ctx).await {
            Ok(envelope) => {
                self.capability.upgrade_strong_suite();
                debug!(state = ?PolicyState::SealedStrong, "Sealed with strong suite");
                return Ok(PolicyOutcome::Sealed {
                    envelope,
                    pqc_used: true,
                    downgrade: None,
                });
            }
            Err((StrongPhase::Seal, failure)) if !failure.is_strong_suite_failure() => {
                return Err(failure)
            }
            Err(failed) => failed,
        };

        let message = failure.message();
        let reason = classify_failure(&message);

        if self.settings.require_strong_suite {
            warn!(reason = reason.as_str(), "Strong suite failed in strict mode; rejecting");
            return Ok(PolicyOutcome::Rejected { reason });
        }

        warn!(
            reason = reason.as_str(),
            phase = phase.as_str(),
            state = ?PolicyState::Downgrading,
            "Strong suite failed; downgrading to classical"
        );
        let envelope = seal_classical(plaintext, &keys.classical, ctx)?;

        let mut hints = ctx.hints.clone();
        hints.insert("phase".to_string(), phase.as_str().to_string());
        let event = DowngradeEvent {
            reason,
            suite_used: Suite::Classical,
            hints,
            raw_message: self.settings.debug_downgrade.then_some(message),
        };

        Ok(PolicyOutcome::Sealed {
            envelope,
            pqc_used: false,
            downgrade: Some(event),
        })
    }

    async fn attempt_strong(
        &self,
        plaintext: &[u8],
        keys: &RecipientPublicKeys,
        ctx: &SealContext,
    ) -> Result<Envelope, (StrongPhase, SealError)> {
        // A missing key is decided before the module is loaded.
        let strong_key = keys.strong.as_deref().ok_or_else(|| {
            (
                StrongPhase::Key,
                SealError::ModuleUnavailable(MISSING_STRONG_KEY_MESSAGE.to_string()),
            )
        })?;

        let module = self
            .strong_suite
            .get_or_load()
            .await
            .map_err(|e| (StrongPhase::Load, e))?;

        seal_hybrid(module.as_ref(), plaintext, &keys.classical, strong_key, ctx)
            .map_err(|e| (StrongPhase::Seal, e))
    }
}

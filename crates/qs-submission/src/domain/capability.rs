//! # Capability Detector
//!
//! Caches whether the host can run the classical suite, and separately whether
//! the strong suite has been proven usable.
//!
//! ## State
//!
//! `uninitialized -> checked`, with `reset()` going back to `uninitialized`.
//! The check never loads the strong-suite module; only a real strong seal may
//! promote `strong_suite_usable` through [`CapabilityDetector::upgrade_strong_suite`].

use crate::ports::outbound::PrimitiveProbe;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Snapshot of host cryptographic capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoCapability {
    /// The classical suite can run.
    pub available: bool,
    /// The strong suite has succeeded at least once since the last reset.
    pub strong_suite_usable: bool,
    /// Why the host is unavailable, if it is.
    pub diagnostic: Option<String>,
}

#[derive(Default)]
struct DetectorState {
    cached: Option<CryptoCapability>,
    strong_suite_usable: bool,
}

/// Process-scoped capability cache.
pub struct CapabilityDetector {
    probe: Arc<dyn PrimitiveProbe>,
    state: Mutex<DetectorState>,
}

impl CapabilityDetector {
    /// Create an unchecked detector around a primitive probe.
    pub fn new(probe: Arc<dyn PrimitiveProbe>) -> Self {
        Self {
            probe,
            state: Mutex::new(DetectorState::default()),
        }
    }

    /// Return the cached capability, probing on first use or when `force` is set.
    pub fn check(&self, force: bool) -> CryptoCapability {
        let mut state = self.state.lock();
        if !force {
            if let Some(cached) = &state.cached {
                return cached.clone();
            }
        }

        let capability = match self.probe.probe() {
            Ok(()) => CryptoCapability {
                available: true,
                strong_suite_usable: state.strong_suite_usable,
                diagnostic: None,
            },
            Err(diagnostic) => {
                warn!(diagnostic = %diagnostic, "Cryptographic primitives unavailable");
                CryptoCapability {
                    available: false,
                    strong_suite_usable: false,
                    diagnostic: Some(diagnostic),
                }
            }
        };
        debug!(
            available = capability.available,
            strong_suite_usable = capability.strong_suite_usable,
            "Capability checked"
        );
        state.cached = Some(capability.clone());
        capability
    }

    /// One-way promotion after a strong-suite operation actually succeeded.
    ///
    /// Idempotent. Does not probe; an unchecked detector records the flag for
    /// the next check.
    pub fn upgrade_strong_suite(&self) {
        let mut state = self.state.lock();
        if state.strong_suite_usable {
            return;
        }
        state.strong_suite_usable = true;
        if let Some(cached) = state.cached.as_mut() {
            if cached.available {
                cached.strong_suite_usable = true;
            }
        }
        debug!("Strong suite marked usable");
    }

    /// Forget everything, including the strong-suite promotion.
    pub fn reset(&self) {
        *self.state.lock() = DetectorState::default();
    }

    /// Whether a check has run since construction or the last reset.
    pub fn is_checked(&self) -> bool {
        self.state.lock().cached.is_some()
    }
}

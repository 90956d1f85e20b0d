//! Lazy one-shot cell for the strong-suite module.
//!
//! The first seal that needs the module triggers the load; the outcome, success
//! or failure, is kept until `reset()`. Nothing loads at construction time.

use crate::error::SealError;
use crate::ports::outbound::{StrongSuiteLoader, StrongSuiteModule};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

type LoadOutcome = Result<Arc<dyn StrongSuiteModule>, SealError>;

/// Process-scoped holder of the strong-suite module.
pub struct StrongSuiteSlot {
    loader: Arc<dyn StrongSuiteLoader>,
    outcome: Mutex<Option<LoadOutcome>>,
}

impl StrongSuiteSlot {
    /// Create an unloaded slot.
    pub fn new(loader: Arc<dyn StrongSuiteLoader>) -> Self {
        Self {
            loader,
            outcome: Mutex::new(None),
        }
    }

    /// Load on first call, then return the cached outcome.
    pub async fn get_or_load(&self) -> LoadOutcome {
        let cached = self.outcome.lock().clone();
        if let Some(outcome) = cached {
            return outcome;
        }

        // The lock is not held across the await; a racing caller may load
        // twice, and the first stored outcome wins.
        let loaded = self.loader.load().await;
        match &loaded {
            Ok(module) => debug!(module = module.name(), "Strong-suite module loaded"),
            Err(e) => warn!(error = %e, "Strong-suite module failed to load"),
        }

        let mut slot = self.outcome.lock();
        slot.get_or_insert(loaded).clone()
    }

    /// Whether a load has been attempted.
    pub fn is_attempted(&self) -> bool {
        self.outcome.lock().is_some()
    }

    /// Forget the cached outcome.
    pub fn reset(&self) {
        *self.outcome.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::strong_suite::MlKem768Module;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        loads: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl StrongSuiteLoader for CountingLoader {
        async fn load(&self) -> LoadOutcome {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SealError::ModuleUnavailable("import failed".into()))
            } else {
                Ok(Arc::new(MlKem768Module))
            }
        }
    }

    fn loader(fail: bool) -> Arc<CountingLoader> {
        Arc::new(CountingLoader {
            loads: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test]
    async fn test_loads_once() {
        let loader = loader(false);
        let slot = StrongSuiteSlot::new(loader.clone());
        assert!(!slot.is_attempted());

        assert!(slot.get_or_load().await.is_ok());
        assert!(slot.get_or_load().await.is_ok());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert!(slot.is_attempted());
    }

    #[tokio::test]
    async fn test_failure_is_cached_until_reset() {
        let loader = loader(true);
        let slot = StrongSuiteSlot::new(loader.clone());

        assert!(slot.get_or_load().await.is_err());
        assert!(slot.get_or_load().await.is_err());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);

        slot.reset();
        assert!(!slot.is_attempted());
        assert!(slot.get_or_load().await.is_err());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }
}

//! Strong-suite module adapters.
//!
//! - `MlKem768Module`: ML-KEM-768 from `shared-crypto`
//! - `BuiltinStrongSuiteLoader`: always yields `MlKem768Module`
//! - `DisabledStrongSuiteLoader`: models a host that refuses to load the module

use crate::error::SealError;
use crate::ports::outbound::{StrongSuiteLoader, StrongSuiteModule};
use async_trait::async_trait;
use shared_crypto::{CryptoError, Encapsulation};
use std::sync::Arc;

/// ML-KEM-768 strong-suite module.
#[derive(Debug, Clone, Copy, Default)]
pub struct MlKem768Module;

impl StrongSuiteModule for MlKem768Module {
    fn name(&self) -> &'static str {
        "ML-KEM-768"
    }

    fn encapsulate(&self, recipient_public: &[u8]) -> Result<Encapsulation, SealError> {
        shared_crypto::encapsulate(recipient_public).map_err(|e| match e {
            CryptoError::InvalidPublicKey => SealError::InvalidKey(format!(
                "ML-KEM-768 public key must be {} bytes, got {}",
                shared_crypto::kem::ML_KEM_768_PUBLIC_KEY_LEN,
                recipient_public.len()
            )),
            other => SealError::EncapsulationFailed(other.to_string()),
        })
    }
}

/// Loader for the in-process ML-KEM-768 module.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinStrongSuiteLoader;

#[async_trait]
impl StrongSuiteLoader for BuiltinStrongSuiteLoader {
    async fn load(&self) -> Result<Arc<dyn StrongSuiteModule>, SealError> {
        Ok(Arc::new(MlKem768Module))
    }
}

/// Loader that always fails with a fixed reason.
#[derive(Debug, Clone)]
pub struct DisabledStrongSuiteLoader {
    reason: String,
}

impl DisabledStrongSuiteLoader {
    /// Fail every load with `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl StrongSuiteLoader for DisabledStrongSuiteLoader {
    async fn load(&self) -> Result<Arc<dyn StrongSuiteModule>, SealError> {
        Err(SealError::ModuleUnavailable(self.reason.clone()))
    }
}

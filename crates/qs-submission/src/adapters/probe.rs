//! Primitive probe backed by the `shared-crypto` self-test.

use crate::ports::outbound::PrimitiveProbe;
use tracing::debug;

/// Runs `shared_crypto::self_test` on every probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPrimitiveProbe;

impl PrimitiveProbe for HostPrimitiveProbe {
    fn probe(&self) -> Result<(), String> {
        shared_crypto::self_test().map_err(|e| e.to_string())?;
        debug!("Primitive self-test passed");
        Ok(())
    }
}

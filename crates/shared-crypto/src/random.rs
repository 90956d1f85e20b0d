//! OS-backed randomness.

use crate::CryptoError;
use rand::rngs::OsRng;
use rand::RngCore;

/// Fill `dest` from the operating system CSPRNG.
///
/// # Errors
///
/// Returns `CryptoError::RandomnessUnavailable` if the OS source cannot be read.
pub fn try_fill_random(dest: &mut [u8]) -> Result<(), CryptoError> {
    OsRng
        .try_fill_bytes(dest)
        .map_err(|e| CryptoError::RandomnessUnavailable(e.to_string()))
}

/// Draw `N` random bytes.
///
/// # Errors
///
/// Returns `CryptoError::RandomnessUnavailable` if the OS source cannot be read.
pub fn random_array<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut out = [0u8; N];
    try_fill_random(&mut out)?;
    Ok(out)
}

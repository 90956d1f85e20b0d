//! HKDF-SHA256 key derivation.
//!
//! Every caller passes its own `salt`/`info` labels so that derivations for
//! different purposes never collide.

use crate::CryptoError;
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Derive a 256-bit key from input key material.
///
/// # Errors
///
/// Returns `CryptoError::KeyDerivationFailed` if expansion fails (not reachable
/// for a 32-byte output, but surfaced rather than asserted).
pub fn derive_key(ikm: &[u8], salt: &[u8], info: &[u8]) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut out = Zeroizing::new([0u8; 32]);
    hk.expand(info, &mut out[..])
        .map_err(|_| CryptoError::KeyDerivationFailed)?;
    Ok(out)
}

/// Derive a 256-bit key from several secrets concatenated in order.
///
/// Used to combine the KEM and key-agreement secrets of a hybrid exchange.
///
/// # Errors
///
/// See [`derive_key`].
pub fn derive_key_combined(
    secrets: &[&[u8]],
    salt: &[u8],
    info: &[u8],
) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let total = secrets.iter().map(|s| s.len()).sum();
    let mut ikm = Zeroizing::new(Vec::with_capacity(total));
    for secret in secrets {
        ikm.extend_from_slice(secret);
    }
    derive_key(&ikm, salt, info)
}

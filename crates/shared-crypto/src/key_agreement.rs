//! # X25519 Key Agreement
//!
//! Ephemeral-static Diffie-Hellman for the classical envelope wrap.
//! Shared secrets that are not contributory (low-order peer points) are rejected.

use crate::CryptoError;
use rand::rngs::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};
use zeroize::Zeroizing;

/// Length of an X25519 public key.
pub const X25519_PUBLIC_KEY_LEN: usize = 32;

/// Parse a recipient public key.
///
/// # Errors
///
/// Returns `CryptoError::InvalidPublicKey` unless `bytes` is exactly 32 bytes.
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    let arr: [u8; X25519_PUBLIC_KEY_LEN] =
        bytes.try_into().map_err(|_| CryptoError::InvalidPublicKey)?;
    Ok(PublicKey::from(arr))
}

/// Parse a recipient public key and reject low-order points.
///
/// A trial exchange against a throwaway secret must be contributory.
///
/// # Errors
///
/// `CryptoError::InvalidPublicKey` for a wrong length,
/// `CryptoError::KeyAgreementFailed` for a low-order point.
pub fn validate_public_key(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    let public = parse_public_key(bytes)?;
    agree_ephemeral(&public)?;
    Ok(public)
}

/// Result of a sender-side agreement: our ephemeral public value plus the secret.
pub struct EphemeralAgreement {
    /// Ephemeral public key to publish in the envelope.
    pub ephemeral_public: [u8; 32],
    /// Shared secret (zeroized on drop).
    pub shared_secret: Zeroizing<[u8; 32]>,
}

/// Run a fresh ephemeral exchange against `recipient`.
///
/// # Errors
///
/// Returns `CryptoError::KeyAgreementFailed` for a non-contributory result.
pub fn agree_ephemeral(recipient: &PublicKey) -> Result<EphemeralAgreement, CryptoError> {
    let secret = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&secret).to_bytes();
    let shared = secret.diffie_hellman(recipient);
    if !shared.was_contributory() {
        return Err(CryptoError::KeyAgreementFailed);
    }
    Ok(EphemeralAgreement {
        ephemeral_public,
        shared_secret: Zeroizing::new(shared.to_bytes()),
    })
}

/// Long-lived X25519 key pair held by a collector.
pub struct X25519KeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl X25519KeyPair {
    /// Generate a random key pair.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Restore from secret bytes.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(bytes);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Public key bytes.
    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Recipient side of the exchange.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidPublicKey` for a malformed peer key and
    /// `CryptoError::KeyAgreementFailed` for a non-contributory result.
    pub fn agree(&self, peer_public: &[u8]) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
        let peer = parse_public_key(peer_public)?;
        let shared = self.secret.diffie_hellman(&peer);
        if !shared.was_contributory() {
            return Err(CryptoError::KeyAgreementFailed);
        }
        Ok(Zeroizing::new(shared.to_bytes()))
    }
}

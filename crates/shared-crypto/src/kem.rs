//! # ML-KEM-768 (FIPS 203)
//!
//! Post-quantum key encapsulation used by the strong envelope suite.

use crate::CryptoError;
use fips203::ml_kem_768;
use fips203::traits::{Decaps, Encaps, KeyGen, SerDes};
use zeroize::Zeroizing;

/// Encapsulation (public) key length.
pub const ML_KEM_768_PUBLIC_KEY_LEN: usize = ml_kem_768::EK_LEN;
/// Ciphertext length.
pub const ML_KEM_768_CIPHERTEXT_LEN: usize = ml_kem_768::CT_LEN;
/// Decapsulation (secret) key length.
pub const ML_KEM_768_SECRET_KEY_LEN: usize = ml_kem_768::DK_LEN;

/// Result of encapsulating to a recipient key.
pub struct Encapsulation {
    /// KEM ciphertext to publish.
    pub ciphertext: Vec<u8>,
    /// Shared secret (zeroized on drop).
    pub shared_secret: Zeroizing<[u8; 32]>,
}

/// Encapsulate a fresh shared secret to `public_key`.
///
/// # Errors
///
/// Returns `CryptoError::InvalidPublicKey` for a key of the wrong size or
/// encoding and `CryptoError::KemFailed` if encapsulation itself fails.
pub fn encapsulate(public_key: &[u8]) -> Result<Encapsulation, CryptoError> {
    let arr: [u8; ML_KEM_768_PUBLIC_KEY_LEN] =
        public_key.try_into().map_err(|_| CryptoError::InvalidPublicKey)?;
    let ek = ml_kem_768::EncapsKey::try_from_bytes(arr).map_err(|_| CryptoError::InvalidPublicKey)?;
    let (ssk, ct) = ek
        .try_encaps()
        .map_err(|e| CryptoError::KemFailed(format!("encapsulation failed: {e}")))?;
    Ok(Encapsulation {
        ciphertext: ct.into_bytes().to_vec(),
        shared_secret: Zeroizing::new(ssk.into_bytes()),
    })
}

/// ML-KEM-768 key pair held by a collector.
pub struct MlKemKeyPair {
    public: Vec<u8>,
    secret: Zeroizing<Vec<u8>>,
}

impl MlKemKeyPair {
    /// Generate a random key pair.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::KemFailed` if key generation fails.
    pub fn generate() -> Result<Self, CryptoError> {
        let (ek, dk) = ml_kem_768::KG::try_keygen()
            .map_err(|e| CryptoError::KemFailed(format!("keygen failed: {e}")))?;
        Ok(Self {
            public: ek.into_bytes().to_vec(),
            secret: Zeroizing::new(dk.into_bytes().to_vec()),
        })
    }

    /// Encapsulation key bytes.
    pub fn public_bytes(&self) -> &[u8] {
        &self.public
    }

    /// Recover the shared secret from a KEM ciphertext.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidInput` for a ciphertext of the wrong size and
    /// `CryptoError::KemFailed` if decapsulation fails.
    pub fn decapsulate(&self, ciphertext: &[u8]) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
        let ct_arr: [u8; ML_KEM_768_CIPHERTEXT_LEN] = ciphertext.try_into().map_err(|_| {
            CryptoError::InvalidInput(format!(
                "KEM ciphertext must be {ML_KEM_768_CIPHERTEXT_LEN} bytes, got {}",
                ciphertext.len()
            ))
        })?;
        let dk_arr: [u8; ML_KEM_768_SECRET_KEY_LEN] = self
            .secret
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::KemFailed("corrupt decapsulation key".into()))?;
        let dk = ml_kem_768::DecapsKey::try_from_bytes(dk_arr)
            .map_err(|e| CryptoError::KemFailed(e.to_string()))?;
        let ct = ml_kem_768::CipherText::try_from_bytes(ct_arr)
            .map_err(|e| CryptoError::KemFailed(e.to_string()))?;
        let ssk = dk
            .try_decaps(&ct)
            .map_err(|e| CryptoError::KemFailed(format!("decapsulation failed: {e}")))?;
        Ok(Zeroizing::new(ssk.into_bytes()))
    }
}

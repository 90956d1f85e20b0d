//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Invalid nonce length
    #[error("Invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Expected nonce length in bytes
        expected: usize,
        /// Actual nonce length in bytes
        actual: usize,
    },

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Key agreement produced a non-contributory (all-zero) shared secret
    #[error("Key agreement failed: non-contributory shared secret")]
    KeyAgreementFailed,

    /// ML-KEM key generation, encapsulation or decapsulation failed
    #[error("KEM operation failed: {0}")]
    KemFailed(String),

    /// HKDF expansion failed
    #[error("Key derivation failed")]
    KeyDerivationFailed,

    /// The operating system random source could not be read
    #[error("Randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    /// A primitive self-test produced an unexpected result
    #[error("Self-test failed: {0}")]
    SelfTestFailed(String),

    /// Invalid input for cryptographic operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

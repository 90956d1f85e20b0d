//! # Symmetric Encryption
//!
//! AES-256-GCM (default) and XChaCha20-Poly1305 behind one interface.
//!
//! ## Security Properties
//!
//! - **AES-256-GCM**: 96-bit random nonce, one message per key in this system
//! - **XChaCha20-Poly1305**: 192-bit nonce, constant-time ARX design

use crate::random::try_fill_random;
use crate::CryptoError;
use aes_gcm::Aes256Gcm;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305,
};
use zeroize::Zeroize;

/// Secret key (256-bit).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Generate random key.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = [0u8; 32];
        try_fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Cipher selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cipher {
    /// AES-256-GCM (default, matches the envelope `aead` tag consumers expect)
    #[default]
    Aes256Gcm,
    /// XChaCha20-Poly1305
    XChaCha20Poly1305,
}

impl Cipher {
    /// Nonce length in bytes.
    pub const fn nonce_len(self) -> usize {
        match self {
            Cipher::Aes256Gcm => 12,
            Cipher::XChaCha20Poly1305 => 24,
        }
    }

    /// Wire tag written into envelopes.
    pub const fn tag(self) -> &'static str {
        match self {
            Cipher::Aes256Gcm => "AES-256-GCM",
            Cipher::XChaCha20Poly1305 => "XChaCha20-Poly1305",
        }
    }

    /// Parse a wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "AES-256-GCM" => Some(Cipher::Aes256Gcm),
            "XChaCha20-Poly1305" => Some(Cipher::XChaCha20Poly1305),
            _ => None,
        }
    }
}

/// Nonce for encryption, sized for its cipher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nonce(Vec<u8>);

impl Nonce {
    /// Create from bytes, checking the length against `cipher`.
    pub fn from_slice(cipher: Cipher, bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != cipher.nonce_len() {
            return Err(CryptoError::InvalidNonceLength {
                expected: cipher.nonce_len(),
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Generate a random nonce for `cipher`.
    pub fn generate(cipher: Cipher) -> Result<Self, CryptoError> {
        let mut bytes = vec![0u8; cipher.nonce_len()];
        try_fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Encrypt plaintext under a fresh random nonce.
///
/// Returns (ciphertext, nonce).
///
/// # Errors
///
/// Returns `CryptoError::EncryptionFailed` if encryption fails.
pub fn encrypt(
    cipher: Cipher,
    key: &SecretKey,
    plaintext: &[u8],
) -> Result<(Vec<u8>, Nonce), CryptoError> {
    let nonce = Nonce::generate(cipher)?;
    let ciphertext = match cipher {
        Cipher::Aes256Gcm => Aes256Gcm::new(key.as_bytes().into())
            .encrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), plaintext),
        Cipher::XChaCha20Poly1305 => XChaCha20Poly1305::new(key.as_bytes().into())
            .encrypt(chacha20poly1305::XNonce::from_slice(nonce.as_bytes()), plaintext),
    }
    .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok((ciphertext, nonce))
}

/// Decrypt and authenticate ciphertext.
///
/// # Errors
///
/// Returns `CryptoError::InvalidNonceLength` for a nonce of the wrong size and
/// `CryptoError::DecryptionFailed` if authentication fails.
pub fn decrypt(
    cipher: Cipher,
    key: &SecretKey,
    ciphertext: &[u8],
    nonce: &Nonce,
) -> Result<Vec<u8>, CryptoError> {
    if nonce.as_bytes().len() != cipher.nonce_len() {
        return Err(CryptoError::InvalidNonceLength {
            expected: cipher.nonce_len(),
            actual: nonce.as_bytes().len(),
        });
    }
    match cipher {
        Cipher::Aes256Gcm => Aes256Gcm::new(key.as_bytes().into())
            .decrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), ciphertext),
        Cipher::XChaCha20Poly1305 => XChaCha20Poly1305::new(key.as_bytes().into())
            .decrypt(chacha20poly1305::XNonce::from_slice(nonce.as_bytes()), ciphertext),
    }
    .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        for cipher in [Cipher::Aes256Gcm, Cipher::XChaCha20Poly1305] {
            let key = SecretKey::generate().unwrap();
            let plaintext = b"Hello, Quantum-Seal!";

            let (ciphertext, nonce) = encrypt(cipher, &key, plaintext).unwrap();
            assert_eq!(nonce.as_bytes().len(), cipher.nonce_len());
            let decrypted = decrypt(cipher, &key, &ciphertext, &nonce).unwrap();

            assert_eq!(decrypted, plaintext);
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = SecretKey::generate().unwrap();
        let key2 = SecretKey::generate().unwrap();

        let (ciphertext, nonce) = encrypt(Cipher::Aes256Gcm, &key1, b"Secret message").unwrap();
        let result = decrypt(Cipher::Aes256Gcm, &key2, &ciphertext, &nonce);

        assert!(matches!(result, Err(CryptoError::DecryptionFailed(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = SecretKey::generate().unwrap();

        let (mut ciphertext, nonce) = encrypt(Cipher::Aes256Gcm, &key, b"Secret message").unwrap();
        ciphertext[0] ^= 0xFF; // Tamper

        let result = decrypt(Cipher::Aes256Gcm, &key, &ciphertext, &nonce);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_nonce_length_rejected() {
        let key = SecretKey::generate().unwrap();
        let (ciphertext, nonce) = encrypt(Cipher::XChaCha20Poly1305, &key, b"m").unwrap();

        let result = decrypt(Cipher::Aes256Gcm, &key, &ciphertext, &nonce);
        assert_eq!(
            result,
            Err(CryptoError::InvalidNonceLength {
                expected: 12,
                actual: 24
            })
        );
    }

    #[test]
    fn test_cipher_tags() {
        assert_eq!(Cipher::from_tag(Cipher::Aes256Gcm.tag()), Some(Cipher::Aes256Gcm));
        assert_eq!(
            Cipher::from_tag("XChaCha20-Poly1305"),
            Some(Cipher::XChaCha20Poly1305)
        );
        assert_eq!(Cipher::from_tag("ROT13"), None);
    }

    #[test]
    fn test_secret_key_from_slice_checks_length() {
        assert!(SecretKey::from_slice(&[0u8; 32]).is_ok());
        assert_eq!(
            SecretKey::from_slice(&[0u8; 16]).err(),
            Some(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 16
            })
        );
    }
}

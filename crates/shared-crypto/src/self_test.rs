//! Power-on style self-test of the primitives the classical suite needs.

use crate::hashing::{keyed_hash, sha256};
use crate::random::random_array;
use crate::symmetric::{decrypt, encrypt, Cipher, SecretKey};
use crate::CryptoError;

const SHA256_ABC: [u8; 4] = [0xba, 0x78, 0x16, 0xbf];

/// Exercise randomness, hashing, the keyed hash and an AEAD round trip.
///
/// Does not touch ML-KEM: the strong suite is only exercised on real use.
///
/// # Errors
///
/// Returns the first failing primitive's error, or `CryptoError::SelfTestFailed`
/// when a primitive runs but returns a wrong answer.
pub fn self_test() -> Result<(), CryptoError> {
    let probe: [u8; 16] = random_array()?;
    if probe == [0u8; 16] {
        return Err(CryptoError::SelfTestFailed("random source returned zeros".into()));
    }

    if sha256(b"abc")[..4] != SHA256_ABC {
        return Err(CryptoError::SelfTestFailed("sha256 known answer mismatch".into()));
    }

    let mac_key = [0x5Au8; 32];
    if keyed_hash(&mac_key, b"self-test") == keyed_hash(&[0xA5u8; 32], b"self-test") {
        return Err(CryptoError::SelfTestFailed("keyed hash ignores its key".into()));
    }

    for cipher in [Cipher::Aes256Gcm, Cipher::XChaCha20Poly1305] {
        let key = SecretKey::generate()?;
        let (ct, nonce) = encrypt(cipher, &key, &probe)?;
        if decrypt(cipher, &key, &ct, &nonce)? != probe {
            return Err(CryptoError::SelfTestFailed(format!(
                "{} round trip mismatch",
                cipher.tag()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_test_passes_on_host() {
        assert_eq!(self_test(), Ok(()));
    }
}

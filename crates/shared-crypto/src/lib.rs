//! # Shared Crypto - Envelope Primitives
//!
//! Capability functions for the Quantum-Seal envelope builder. No policy lives here.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `random` | OS CSPRNG | Keys, nonces |
//! | `hashing` | SHA-256, BLAKE3 keyed | Content addressing, MAC |
//! | `kdf` | HKDF-SHA256 | Wrapping-key derivation |
//! | `symmetric` | AES-256-GCM, XChaCha20-Poly1305 | Content and key wrapping |
//! | `key_agreement` | X25519 | Classical suite |
//! | `kem` | ML-KEM-768 | Strong (post-quantum) suite |
//!
//! ## Security Properties
//!
//! - **X25519**: non-contributory shared secrets are rejected
//! - **ML-KEM-768**: FIPS 203, IND-CCA2
//! - Secret material is held in `Zeroizing` buffers and cleared on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod kdf;
pub mod kem;
pub mod key_agreement;
pub mod random;
pub mod self_test;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{keyed_hash, sha256, Hash};
pub use kdf::{derive_key, derive_key_combined};
pub use kem::{encapsulate, Encapsulation, MlKemKeyPair};
pub use key_agreement::{
    agree_ephemeral, parse_public_key, validate_public_key, EphemeralAgreement, X25519KeyPair,
};
pub use random::{random_array, try_fill_random};
pub use self_test::self_test;
pub use symmetric::{decrypt, encrypt, Cipher, Nonce, SecretKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

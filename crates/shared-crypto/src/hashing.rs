//! # Hashing
//!
//! SHA-256 for content addressing and BLAKE3 in keyed mode as the MAC.
//!
//! Content addresses must be reproducible by any collector, so they use the
//! ubiquitous SHA-256. The keyed hash is local-only and uses BLAKE3.

use sha2::{Digest, Sha256};

/// 256-bit digest.
pub type Hash = [u8; 32];

/// SHA-256 of `data` (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Keyed hash (MAC) with BLAKE3.
pub fn keyed_hash(key: &[u8; 32], data: &[u8]) -> Hash {
    *blake3::keyed_hash(key, data).as_bytes()
}

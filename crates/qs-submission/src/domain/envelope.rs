//! # Envelope Builder
//!
//! Seals a plaintext into a versioned envelope, classical-only or hybrid.
//!
//! ## Construction
//!
//! 1. A random content key encrypts the plaintext under a random nonce.
//! 2. An ephemeral X25519 exchange with the recipient yields `dh`; the classical
//!    wrapping key is `HKDF(dh, CLASSICAL_WRAP_SALT, WRAP_INFO)`.
//! 3. Hybrid only: an ML-KEM encapsulation yields `ss`; the long-suite wrapping
//!    key is `HKDF(ss || dh, HYBRID_WRAP_SALT, WRAP_INFO)`.
//!
//! ## Wire invariant
//!
//! The long-suite wrap fields are always present. For a classical envelope they
//! are empty strings, never null or absent, so [`open_envelope`] branches on
//! field emptiness rather than on the suite tag.

use crate::error::SealError;
use crate::ports::outbound::{StrongSuiteModule, Timestamp};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use shared_crypto::{
    agree_ephemeral, decrypt, derive_key, derive_key_combined, encrypt, parse_public_key,
    validate_public_key, Cipher, CryptoError, MlKemKeyPair, Nonce, SecretKey, X25519KeyPair,
};
use std::collections::BTreeMap;
use zeroize::Zeroizing;

/// HKDF salt for the classical wrapping key.
pub const CLASSICAL_WRAP_SALT: &[u8] = b"quantum-seal/classical-wrap/v1";
/// HKDF salt for the hybrid (long-suite) wrapping key.
pub const HYBRID_WRAP_SALT: &[u8] = b"quantum-seal/hybrid-wrap/v1";
/// HKDF info shared by both wraps; the salts keep them apart.
pub const WRAP_INFO: &[u8] = b"content-key";

/// Key-establishment suite of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suite {
    /// ML-KEM-768 + X25519
    Hybrid,
    /// X25519 only
    Classical,
}

impl Suite {
    /// Wire tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Suite::Hybrid => "hybrid",
            Suite::Classical => "classical",
        }
    }
}

/// A wrapped content key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyWrap {
    /// Wrap nonce, base64
    pub nonce: String,
    /// Wrapped content key, base64
    pub wrapped: String,
}

/// The strong-suite wrap. All fields are empty strings for classical envelopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongSuiteWrap {
    /// Wrap nonce, base64
    pub nonce: String,
    /// Wrapped content key, base64
    pub wrapped: String,
    /// KEM ciphertext, base64
    pub encapsulation: String,
}

impl LongSuiteWrap {
    /// True when the strong suite produced this wrap.
    pub fn is_populated(&self) -> bool {
        !self.wrapped.is_empty()
    }
}

/// Non-sensitive envelope metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeMeta {
    /// Creation time, ISO 8601 UTC
    pub created_at: String,
    /// Sender hints
    #[serde(flatten)]
    pub hints: BTreeMap<String, String>,
}

/// Versioned encrypted container. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Protocol version tag
    pub v: String,
    /// Suite actually used
    pub suite: Suite,
    /// AEAD tag
    pub aead: String,
    /// Ephemeral X25519 public key, hex
    #[serde(rename = "longSuiteEphemeralPublic")]
    pub ephemeral_public: String,
    /// Strong-suite wrap (empty strings when classical)
    pub long_suite_wrap: LongSuiteWrap,
    /// Classical wrap (always populated)
    pub classical_wrap: KeyWrap,
    /// Content nonce, base64
    pub content_nonce: String,
    /// Content ciphertext, base64
    pub ciphertext: String,
    /// Metadata
    pub meta: EnvelopeMeta,
}

impl Envelope {
    /// JSON encoding placed in the outbound `encrypted` field.
    pub fn to_json(&self) -> Result<String, SealError> {
        serde_json::to_string(self).map_err(|e| SealError::MalformedEnvelope(e.to_string()))
    }

    /// Parse a JSON-encoded envelope.
    pub fn from_json(input: &str) -> Result<Self, SealError> {
        serde_json::from_str(input).map_err(|e| SealError::MalformedEnvelope(e.to_string()))
    }
}

/// Per-seal parameters that are not key material.
#[derive(Debug, Clone)]
pub struct SealContext {
    /// Protocol version tag
    pub version: String,
    /// Content and wrap cipher
    pub cipher: Cipher,
    /// Creation time (ms since epoch)
    pub created_at: Timestamp,
    /// Sender hints for `meta`
    pub hints: BTreeMap<String, String>,
}

impl SealContext {
    fn meta(&self) -> Result<EnvelopeMeta, SealError> {
        let created = i64::try_from(self.created_at)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or(SealError::InvalidTimestamp(self.created_at))?;
        Ok(EnvelopeMeta {
            created_at: created.to_rfc3339_opts(SecondsFormat::Millis, true),
            hints: self.hints.clone(),
        })
    }
}

/// Content encryption plus the classical wrap, shared by both suites.
struct ClassicalParts {
    content_key: SecretKey,
    dh_secret: Zeroizing<[u8; 32]>,
    ephemeral_public: [u8; 32],
    classical_wrap: KeyWrap,
    content_nonce: Nonce,
    ciphertext: Vec<u8>,
}

/// Check a recipient classical key before any suite is attempted.
///
/// # Errors
///
/// `SealError::InvalidKey` for a wrong length or a low-order point.
pub fn check_classical_key(recipient_classical: &[u8]) -> Result<(), SealError> {
    validate_public_key(recipient_classical)
        .map(|_| ())
        .map_err(|e| match e {
            CryptoError::KeyAgreementFailed => {
                SealError::InvalidKey("classical public key is a low-order point".into())
            }
            _ => SealError::InvalidKey(format!(
                "classical public key must be 32 bytes, got {}",
                recipient_classical.len()
            )),
        })
}

fn seal_classical_parts(
    plaintext: &[u8],
    recipient_classical: &[u8],
    cipher: Cipher,
) -> Result<ClassicalParts, SealError> {
    let recipient = parse_public_key(recipient_classical).map_err(|_| {
        SealError::InvalidKey(format!(
            "classical public key must be 32 bytes, got {}",
            recipient_classical.len()
        ))
    })?;

    let content_key = SecretKey::generate()?;
    let (ciphertext, content_nonce) = encrypt(cipher, &content_key, plaintext)?;

    let agreement = agree_ephemeral(&recipient).map_err(|e| match e {
        CryptoError::KeyAgreementFailed => {
            SealError::InvalidKey("classical public key is a low-order point".into())
        }
        other => SealError::Crypto(other),
    })?;
    let wrap_key = derive_key(&agreement.shared_secret[..], CLASSICAL_WRAP_SALT, WRAP_INFO)?;
    let (wrapped, wrap_nonce) = encrypt(
        cipher,
        &SecretKey::from_bytes(*wrap_key),
        content_key.as_bytes(),
    )?;

    Ok(ClassicalParts {
        content_key,
        dh_secret: agreement.shared_secret,
        ephemeral_public: agreement.ephemeral_public,
        classical_wrap: KeyWrap {
            nonce: BASE64.encode(wrap_nonce.as_bytes()),
            wrapped: BASE64.encode(wrapped),
        },
        content_nonce,
        ciphertext,
    })
}

fn assemble(
    parts: ClassicalParts,
    suite: Suite,
    long_suite_wrap: LongSuiteWrap,
    meta: EnvelopeMeta,
    ctx: &SealContext,
) -> Envelope {
    Envelope {
        v: ctx.version.clone(),
        suite,
        aead: ctx.cipher.tag().to_string(),
        ephemeral_public: hex::encode(parts.ephemeral_public),
        long_suite_wrap,
        classical_wrap: parts.classical_wrap,
        content_nonce: BASE64.encode(parts.content_nonce.as_bytes()),
        ciphertext: BASE64.encode(&parts.ciphertext),
        meta,
    }
}

/// Classical-only seal.
///
/// # Errors
///
/// `SealError::InvalidKey` for a malformed recipient key and
/// `SealError::InvalidTimestamp` for an unrepresentable creation time;
/// primitive failures surface as `SealError::Crypto`.
pub fn seal_classical(
    plaintext: &[u8],
    recipient_classical: &[u8],
    ctx: &SealContext,
) -> Result<Envelope, SealError> {
    let meta = ctx.meta()?;
    let parts = seal_classical_parts(plaintext, recipient_classical, ctx.cipher)?;
    Ok(assemble(parts, Suite::Classical, LongSuiteWrap::default(), meta, ctx))
}

/// Hybrid seal: the classical wrap plus a strong-suite wrap.
///
/// # Errors
///
/// `SealError::InvalidKey` and `SealError::InvalidTimestamp` as for
/// [`seal_classical`]. Any failure of the strong-suite step is reported as
/// `SealError::EncapsulationFailed`.
pub fn seal_hybrid(
    module: &dyn StrongSuiteModule,
    plaintext: &[u8],
    recipient_classical: &[u8],
    recipient_strong: &[u8],
    ctx: &SealContext,
) -> Result<Envelope, SealError> {
    let meta = ctx.meta()?;
    let parts = seal_classical_parts(plaintext, recipient_classical, ctx.cipher)?;

    let encapsulation = module.encapsulate(recipient_strong).map_err(|e| match e {
        SealError::EncapsulationFailed(_) | SealError::ModuleUnavailable(_) => e,
        other => SealError::EncapsulationFailed(other.message()),
    })?;
    let long_key = derive_key_combined(
        &[&encapsulation.shared_secret[..], &parts.dh_secret[..]],
        HYBRID_WRAP_SALT,
        WRAP_INFO,
    )
    .map_err(|e| SealError::EncapsulationFailed(e.to_string()))?;
    let (wrapped, nonce) = encrypt(
        ctx.cipher,
        &SecretKey::from_bytes(*long_key),
        parts.content_key.as_bytes(),
    )
    .map_err(|e| SealError::EncapsulationFailed(format!("wrap failed: {e}")))?;

    let long_suite_wrap = LongSuiteWrap {
        nonce: BASE64.encode(nonce.as_bytes()),
        wrapped: BASE64.encode(wrapped),
        encapsulation: BASE64.encode(&encapsulation.ciphertext),
    };
    Ok(assemble(parts, Suite::Hybrid, long_suite_wrap, meta, ctx))
}

fn decode_b64(field: &str, value: &str) -> Result<Vec<u8>, SealError> {
    BASE64
        .decode(value)
        .map_err(|e| SealError::MalformedEnvelope(format!("{field}: {e}")))
}

/// Collector-side decrypt path accepting both hybrid and classical envelopes.
///
/// Uses the long-suite wrap when it is populated and a strong-suite key is
/// supplied, otherwise the classical wrap. The suite tag is not consulted.
///
/// # Errors
///
/// `SealError::MalformedEnvelope` for undecodable fields or an unknown AEAD;
/// authentication failures surface as `SealError::Crypto`.
pub fn open_envelope(
    envelope: &Envelope,
    classical: &X25519KeyPair,
    strong: Option<&MlKemKeyPair>,
) -> Result<Vec<u8>, SealError> {
    let cipher = Cipher::from_tag(&envelope.aead)
        .ok_or_else(|| SealError::MalformedEnvelope(format!("unknown aead {}", envelope.aead)))?;
    let ephemeral = hex::decode(&envelope.ephemeral_public)
        .map_err(|e| SealError::MalformedEnvelope(format!("longSuiteEphemeralPublic: {e}")))?;
    let dh = classical.agree(&ephemeral)?;

    let (wrap_key, wrap) = match (envelope.long_suite_wrap.is_populated(), strong) {
        (true, Some(strong)) => {
            let long = &envelope.long_suite_wrap;
            let ss = strong.decapsulate(&decode_b64("longSuiteWrap.encapsulation", &long.encapsulation)?)?;
            let key = derive_key_combined(&[&ss[..], &dh[..]], HYBRID_WRAP_SALT, WRAP_INFO)?;
            (key, KeyWrap { nonce: long.nonce.clone(), wrapped: long.wrapped.clone() })
        }
        _ => (
            derive_key(&dh[..], CLASSICAL_WRAP_SALT, WRAP_INFO)?,
            envelope.classical_wrap.clone(),
        ),
    };

    let wrap_nonce = Nonce::from_slice(cipher, &decode_b64("wrap.nonce", &wrap.nonce)?)?;
    let content_key = Zeroizing::new(decrypt(
        cipher,
        &SecretKey::from_bytes(*wrap_key),
        &decode_b64("wrap.wrapped", &wrap.wrapped)?,
        &wrap_nonce,
    )?);
    let content_key = SecretKey::from_slice(&content_key)?;

    let content_nonce = Nonce::from_slice(cipher, &decode_b64("contentNonce", &envelope.content_nonce)?)?;
    Ok(decrypt(
        cipher,
        &content_key,
        &decode_b64("ciphertext", &envelope.ciphertext)?,
        &content_nonce,
    )?)
}

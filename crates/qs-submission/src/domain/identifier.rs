//! # Request Identifiers
//!
//! Content addresses for canonical payloads.
//!
//! ## Invariants
//!
//! - The identifier is a pure function of the `CanonicalPayload`: no randomness,
//!   no timestamp. A retry of the same payload recomputes the same identifier.
//! - The encoded form is independent of map insertion order: object keys are
//!   written in sorted order regardless of how `serde_json` stores them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_crypto::sha256;
use std::fmt;

/// Length of a rendered identifier (SHA-256, lowercase hex).
pub const IDENTIFIER_HEX_LEN: usize = 64;

/// Output of the canonicalizer: an order-stable structured value.
///
/// The core does not re-normalize; producing this value is the
/// canonicalizer's responsibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPayload(Value);

impl CanonicalPayload {
    /// Wrap an already-canonical value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the structured value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Deterministic encoding: compact JSON with sorted object keys.
    ///
    /// This is both the hashed form and the plaintext that gets sealed.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        write_canonical(&self.0, &mut out);
        out.into_bytes()
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // A JSON string scalar renders with the same escaping serde uses.
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Fixed-length content address of a canonical payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestIdentifier(String);

impl RequestIdentifier {
    /// Parse a stored or received identifier; accepts only 64 lowercase hex chars.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == IDENTIFIER_HEX_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(s.to_string()))
    }

    /// Hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RequestIdentifier {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("not a request identifier: {s:?}"))
    }
}

impl From<RequestIdentifier> for String {
    fn from(id: RequestIdentifier) -> Self {
        id.0
    }
}

/// Hash a canonical payload into its identifier. Total, no side effects.
pub fn generate_identifier(canonical: &CanonicalPayload) -> RequestIdentifier {
    RequestIdentifier(hex::encode(sha256(&canonical.to_canonical_bytes())))
}

//! Form-payload canonicalizer.
//!
//! Normalization rules, applied recursively:
//! - object keys sorted, `null` members dropped
//! - strings: CRLF and lone CR become LF, then surrounding whitespace is trimmed
//! - members named in `lowercase_fields` are lowercased (any depth)
//! - arrays made only of scalars are sorted; other arrays keep their order

use crate::domain::identifier::CanonicalPayload;
use crate::error::CanonicalizeError;
use crate::ports::outbound::Canonicalizer;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Deepest nesting accepted in a form payload.
pub const MAX_DEPTH: usize = 32;

/// Canonicalizer for flat or lightly nested form payloads.
#[derive(Debug, Clone)]
pub struct FormCanonicalizer {
    lowercase_fields: Vec<String>,
}

impl Default for FormCanonicalizer {
    fn default() -> Self {
        Self {
            lowercase_fields: vec!["email".to_string()],
        }
    }
}

impl FormCanonicalizer {
    /// Canonicalizer lowercasing the given member names.
    pub fn with_lowercase_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lowercase_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    fn normalize(&self, value: &Value, lowercase: bool, depth: usize) -> Result<Value, CanonicalizeError> {
        if depth > MAX_DEPTH {
            return Err(CanonicalizeError::Invalid(format!(
                "nesting deeper than {MAX_DEPTH} levels"
            )));
        }

        Ok(match value {
            Value::String(s) => Value::String(normalize_string(s, lowercase)),
            Value::Array(items) => {
                let mut out = items
                    .iter()
                    .map(|item| self.normalize(item, lowercase, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                if out.iter().all(is_scalar) {
                    out.sort_by(compare_scalars);
                }
                Value::Array(out)
            }
            Value::Object(map) => {
                let mut out = Map::new();
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                for key in keys {
                    let item = &map[key.as_str()];
                    if item.is_null() {
                        continue;
                    }
                    let lower = self.lowercase_fields.iter().any(|f| f == key);
                    out.insert(key.clone(), self.normalize(item, lower, depth + 1)?);
                }
                Value::Object(out)
            }
            scalar => scalar.clone(),
        })
    }
}

impl Canonicalizer for FormCanonicalizer {
    fn canonicalize(&self, raw: &Value) -> Result<CanonicalPayload, CanonicalizeError> {
        if !raw.is_object() {
            return Err(CanonicalizeError::NotAnObject);
        }
        Ok(CanonicalPayload::new(self.normalize(raw, false, 0)?))
    }
}

fn normalize_string(s: &str, lowercase: bool) -> String {
    let unified = s.replace("\r\n", "\n").replace('\r', "\n");
    let trimmed = unified.trim();
    if lowercase {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Null)
}

fn scalar_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        _ => 3,
    }
}

fn compare_scalars(a: &Value, b: &Value) -> Ordering {
    scalar_rank(a).cmp(&scalar_rank(b)).then_with(|| match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal)
            .then_with(|| x.to_string().cmp(&y.to_string())),
        _ => a.to_string().cmp(&b.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identifier::generate_identifier;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_rules() {
        let raw = json!({
            "note": "  x\r\ny\r ",
            "email": " A@B.com ",
            "tags": ["b", "a", "c"],
            "website": null,
            "nested": {"Email": "KEEP", "email": "LOWER"}
        });
        let canonical = FormCanonicalizer::default().canonicalize(&raw).unwrap();

        assert_eq!(
            canonical.as_value(),
            &json!({
                "email": "a@b.com",
                "nested": {"Email": "KEEP", "email": "lower"},
                "note": "x\ny",
                "tags": ["a", "b", "c"]
            })
        );
    }

    #[test]
    fn test_email_and_crlf_payloads_share_identifier() {
        let canon = FormCanonicalizer::default();
        let messy = canon
            .canonicalize(&json!({"email": " A@B.com ", "note": "x\r\ny"}))
            .unwrap();
        let clean = canon
            .canonicalize(&json!({"email": "a@b.com", "note": "x\ny"}))
            .unwrap();

        assert_eq!(messy, clean);
        assert_eq!(generate_identifier(&messy), generate_identifier(&clean));
    }

    #[test]
    fn test_mixed_arrays_keep_order() {
        let canonical = FormCanonicalizer::default()
            .canonicalize(&json!({"rows": [{"b": 1}, {"a": 2}], "n": [3, 1, 2]}))
            .unwrap();
        assert_eq!(canonical.as_value()["rows"], json!([{"b": 1}, {"a": 2}]));
        assert_eq!(canonical.as_value()["n"], json!([1, 2, 3]));
    }

    #[test]
    fn test_rejects_non_objects_and_deep_nesting() {
        let canon = FormCanonicalizer::default();
        assert_eq!(canon.canonicalize(&json!([1, 2])), Err(CanonicalizeError::NotAnObject));

        let mut deep = json!("leaf");
        for _ in 0..=MAX_DEPTH {
            deep = json!({ "x": deep });
        }
        assert!(matches!(canon.canonicalize(&deep), Err(CanonicalizeError::Invalid(_))));
    }

    #[test]
    fn test_custom_lowercase_fields() {
        let canon = FormCanonicalizer::with_lowercase_fields(["username"]);
        let canonical = canon
            .canonicalize(&json!({"username": "Alice", "email": "Bob@X.org"}))
            .unwrap();
        assert_eq!(canonical.as_value()["username"], "alice");
        assert_eq!(canonical.as_value()["email"], "Bob@X.org");
    }

    proptest! {
        #[test]
        fn prop_incidental_formatting_does_not_change_identifier(
            local in "[a-zA-Z]{1,12}",
            lines in proptest::collection::vec("[a-z ]{0,8}", 1..4),
            mut tags in proptest::collection::vec("[a-z]{1,5}", 0..5),
        ) {
            let canon = FormCanonicalizer::default();
            let clean = json!({
                "email": format!("{}@example.org", local.to_lowercase()),
                "note": lines.join("\n").trim().to_string(),
                "tags": tags.clone(),
            });
            tags.reverse();
            let messy = json!({
                "tags": tags,
                "note": format!("  {}\r\n", lines.join("\r\n")),
                "email": format!(" {}@EXAMPLE.org ", local),
            });

            prop_assert_eq!(
                generate_identifier(&canon.canonicalize(&clean).unwrap()),
                generate_identifier(&canon.canonicalize(&messy).unwrap())
            );
        }
    }
}

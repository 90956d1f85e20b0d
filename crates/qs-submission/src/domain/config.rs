//! Submission configuration with validation.
//!
//! Every option has a default, so a TOML file only needs `endpoint` and
//! `public_keys.classical`.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use shared_crypto::kem::ML_KEM_768_PUBLIC_KEY_LEN;
use shared_crypto::key_agreement::X25519_PUBLIC_KEY_LEN;
use shared_crypto::{validate_public_key, Cipher};
use std::collections::BTreeMap;

/// Default envelope protocol version tag.
pub const DEFAULT_VERSION: &str = "1";
/// Default serialized-plaintext ceiling (32 KiB).
pub const DEFAULT_MAX_PLAINTEXT_BYTES: usize = 32 * 1024;
/// Default serialized-envelope ceiling (56 KiB).
pub const DEFAULT_MAX_ENVELOPE_BYTES: usize = 56 * 1024;
/// Default pending-submission TTL (5 minutes).
pub const DEFAULT_PENDING_TTL_MS: u64 = 300_000;
/// Default scoped-storage key for the pending record.
pub const DEFAULT_STORAGE_KEY: &str = "qs:pending-submission";
/// Default honeypot form field.
pub const DEFAULT_HONEYPOT_FIELD: &str = "website";

/// Main submission configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Collector endpoint handed to the transport
    pub endpoint: String,
    /// Recipient public keys (hex)
    pub public_keys: PublicKeysConfig,
    /// Envelope protocol version tag
    pub version: String,
    /// Ceiling on the serialized canonical payload
    pub max_plaintext_bytes: usize,
    /// Ceiling on the serialized outbound submission
    pub max_envelope_bytes: usize,
    /// Lifetime of a pending record in milliseconds
    pub pending_ttl_ms: u64,
    /// Scoped-storage key for the pending record
    pub storage_key: String,
    /// Sliding-window limit, or `false` to disable
    pub rate_limit: RateLimitSetting,
    /// Fail closed when the strong suite cannot be used
    pub require_strong_suite: bool,
    /// Try the strong suite at all (false never loads the module)
    pub attempt_strong_suite: bool,
    /// Attach raw failure text to downgrade events
    pub debug_downgrade: bool,
    /// Bot-deflection field; a non-empty value short-circuits the submission
    pub honeypot_field: Option<String>,
    /// AEAD wire tag
    pub aead: String,
    /// Non-sensitive hints copied into envelope metadata
    pub sender_hints: BTreeMap<String, String>,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            public_keys: PublicKeysConfig::default(),
            version: DEFAULT_VERSION.to_string(),
            max_plaintext_bytes: DEFAULT_MAX_PLAINTEXT_BYTES,
            max_envelope_bytes: DEFAULT_MAX_ENVELOPE_BYTES,
            pending_ttl_ms: DEFAULT_PENDING_TTL_MS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            rate_limit: RateLimitSetting::default(),
            require_strong_suite: false,
            attempt_strong_suite: true,
            debug_downgrade: false,
            honeypot_field: Some(DEFAULT_HONEYPOT_FIELD.to_string()),
            aead: Cipher::default().tag().to_string(),
            sender_hints: BTreeMap::new(),
        }
    }
}

impl SubmissionConfig {
    /// Parse from TOML. Missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }

        if self.max_plaintext_bytes == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_plaintext_bytes cannot be 0".into(),
            ));
        }

        if self.max_envelope_bytes < self.max_plaintext_bytes {
            return Err(ConfigError::InvalidLimit(format!(
                "max_envelope_bytes ({}) must be at least max_plaintext_bytes ({})",
                self.max_envelope_bytes, self.max_plaintext_bytes
            )));
        }

        if self.pending_ttl_ms == 0 {
            return Err(ConfigError::InvalidTtl);
        }

        if let RateLimitSetting::Enabled(window) = self.rate_limit {
            if window.max == 0 {
                return Err(ConfigError::InvalidRateLimit("max cannot be 0".into()));
            }
            if window.window_ms == 0 {
                return Err(ConfigError::InvalidRateLimit("window_ms cannot be 0".into()));
            }
        }

        if self.require_strong_suite && !self.attempt_strong_suite {
            return Err(ConfigError::StrictModeWithoutAttempt);
        }

        self.cipher()?;
        self.recipient_keys()?;
        Ok(())
    }

    /// AEAD selected by the `aead` tag.
    pub fn cipher(&self) -> Result<Cipher, ConfigError> {
        Cipher::from_tag(&self.aead).ok_or_else(|| ConfigError::UnknownAead(self.aead.clone()))
    }

    /// Decode the configured recipient keys.
    pub fn recipient_keys(&self) -> Result<RecipientPublicKeys, ConfigError> {
        self.public_keys.decode()
    }
}

/// Recipient public keys as configured (hex).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicKeysConfig {
    /// X25519 public key, 32 bytes hex
    pub classical: String,
    /// ML-KEM-768 encapsulation key, hex
    pub strong: Option<String>,
}

impl PublicKeysConfig {
    fn decode(&self) -> Result<RecipientPublicKeys, ConfigError> {
        let classical = hex::decode(self.classical.trim())
            .map_err(|e| ConfigError::InvalidPublicKey(format!("classical: {e}")))?;
        let classical: [u8; X25519_PUBLIC_KEY_LEN] =
            classical.as_slice().try_into().map_err(|_| {
                ConfigError::InvalidPublicKey(format!(
                    "classical: expected {X25519_PUBLIC_KEY_LEN} bytes, got {}",
                    classical.len()
                ))
            })?;
        validate_public_key(&classical).map_err(|_| {
            ConfigError::InvalidPublicKey("classical: low-order point".to_string())
        })?;

        let strong = match self.strong.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(encoded) => {
                let bytes = hex::decode(encoded)
                    .map_err(|e| ConfigError::InvalidPublicKey(format!("strong: {e}")))?;
                if bytes.len() != ML_KEM_768_PUBLIC_KEY_LEN {
                    return Err(ConfigError::InvalidPublicKey(format!(
                        "strong: expected {ML_KEM_768_PUBLIC_KEY_LEN} bytes, got {}",
                        bytes.len()
                    )));
                }
                Some(bytes)
            }
        };

        Ok(RecipientPublicKeys { classical, strong })
    }
}

/// Decoded recipient public keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientPublicKeys {
    /// X25519 public key
    pub classical: [u8; 32],
    /// ML-KEM-768 encapsulation key, when the collector publishes one
    pub strong: Option<Vec<u8>>,
}

/// Sliding-window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitWindow {
    /// Maximum admitted submissions inside the window
    pub max: usize,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl Default for RateLimitWindow {
    fn default() -> Self {
        Self {
            max: 2,
            window_ms: 60_000,
        }
    }
}

/// Rate limiting: a window, or disabled.
///
/// Deserializes from `false` (disabled), `true` (default window) or a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RateLimitRepr", into = "RateLimitRepr")]
pub enum RateLimitSetting {
    /// Limit with the given window
    Enabled(RateLimitWindow),
    /// Always admit
    Disabled,
}

impl Default for RateLimitSetting {
    fn default() -> Self {
        RateLimitSetting::Enabled(RateLimitWindow::default())
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RateLimitRepr {
    Flag(bool),
    Window(RateLimitWindow),
}

impl From<RateLimitRepr> for RateLimitSetting {
    fn from(repr: RateLimitRepr) -> Self {
        match repr {
            RateLimitRepr::Flag(false) => RateLimitSetting::Disabled,
            RateLimitRepr::Flag(true) => RateLimitSetting::default(),
            RateLimitRepr::Window(window) => RateLimitSetting::Enabled(window),
        }
    }
}

impl From<RateLimitSetting> for RateLimitRepr {
    fn from(setting: RateLimitSetting) -> Self {
        match setting {
            RateLimitSetting::Enabled(window) => RateLimitRepr::Window(window),
            RateLimitSetting::Disabled => RateLimitRepr::Flag(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> SubmissionConfig {
        SubmissionConfig {
            endpoint: "https://collector.example/submit".into(),
            public_keys: PublicKeysConfig {
                classical: hex::encode([9u8; 32]),
                strong: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = SubmissionConfig::default();
        assert_eq!(config.version, "1");
        assert_eq!(config.max_plaintext_bytes, 32768);
        assert_eq!(config.max_envelope_bytes, 57344);
        assert_eq!(config.pending_ttl_ms, 300_000);
        assert_eq!(
            config.rate_limit,
            RateLimitSetting::Enabled(RateLimitWindow {
                max: 2,
                window_ms: 60_000
            })
        );
        assert!(!config.require_strong_suite);
        assert!(config.attempt_strong_suite);
        assert!(!config.debug_downgrade);
        assert_eq!(config.cipher(), Ok(Cipher::Aes256Gcm));
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(valid_config().validate(), Ok(()));
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let config = SubmissionConfig {
            endpoint: "  ".into(),
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingEndpoint));
    }

    #[test]
    fn test_envelope_ceiling_below_plaintext_rejected() {
        let config = SubmissionConfig {
            max_envelope_bytes: 100,
            max_plaintext_bytes: 200,
            ..valid_config()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLimit(_))));
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let config = SubmissionConfig {
            rate_limit: RateLimitSetting::Enabled(RateLimitWindow {
                max: 0,
                window_ms: 1000,
            }),
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRateLimit(_))
        ));
    }

    #[test]
    fn test_strict_without_attempt_rejected() {
        let config = SubmissionConfig {
            require_strong_suite: true,
            attempt_strong_suite: false,
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ConfigError::StrictModeWithoutAttempt));
    }

    #[test]
    fn test_bad_classical_key_rejected() {
        let mut config = valid_config();
        config.public_keys.classical = "abcd".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_low_order_classical_key_rejected() {
        let mut config = valid_config();
        config.public_keys.classical = hex::encode([0u8; 32]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidPublicKey(
                "classical: low-order point".into()
            ))
        );
    }

    #[test]
    fn test_bad_strong_key_length_rejected() {
        let mut config = valid_config();
        config.public_keys.strong = Some(hex::encode([1u8; 16]));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_unknown_aead_rejected() {
        let config = SubmissionConfig {
            aead: "DES".into(),
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownAead("DES".into()))
        );
    }

    #[test]
    fn test_from_toml_with_disabled_rate_limit() {
        let toml = format!(
            r#"
            endpoint = "https://collector.example/submit"
            rate_limit = false
            require_strong_suite = true

            [public_keys]
            classical = "{}"
            "#,
            hex::encode([3u8; 32])
        );
        let config = SubmissionConfig::from_toml_str(&toml).unwrap();
        assert_eq!(config.rate_limit, RateLimitSetting::Disabled);
        assert!(config.require_strong_suite);
        assert_eq!(config.pending_ttl_ms, DEFAULT_PENDING_TTL_MS);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_from_toml_with_window() {
        let toml = r#"
            endpoint = "https://collector.example/submit"
            rate_limit = { max = 5, window_ms = 1000 }
        "#;
        let config = SubmissionConfig::from_toml_str(toml).unwrap();
        assert_eq!(
            config.rate_limit,
            RateLimitSetting::Enabled(RateLimitWindow {
                max: 5,
                window_ms: 1000
            })
        );
    }

    #[test]
    fn test_from_toml_parse_error() {
        assert!(matches!(
            SubmissionConfig::from_toml_str("endpoint = ["),
            Err(ConfigError::Parse(_))
        ));
    }
}

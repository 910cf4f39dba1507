//! Configuration constants and types for field encryption.

use crate::envelope::EnvelopeFormat;
use crate::error::Result;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Master key length in bytes (256 bits).
pub const MASTER_KEY_LENGTH: usize = 32;

/// Prefix for environment variables read by [`KeyConfig::from_env`].
pub const ENV_PREFIX: &str = "FIELD_CRYPT";

/// Default log level for the command-line tool.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// PBKDF2-HMAC-SHA512 parameters for per-envelope key derivation.
pub mod pbkdf2_params {
    /// Iteration count. Changing it makes existing envelopes undecryptable.
    pub const ITERATIONS: u32 = 100_000;

    /// Salt length in bytes.
    pub const SALT_LENGTH: usize = 64;

    /// Output length in bytes (256 bits).
    pub const OUTPUT_LENGTH: usize = 32;
}

/// Fixed byte layout of a stored envelope.
pub mod envelope_layout {
    use super::pbkdf2_params::SALT_LENGTH;

    /// AES-GCM IV length. 16 bytes rather than the usual 12.
    pub const IV_LENGTH: usize = 16;

    /// GCM authentication tag length.
    pub const TAG_LENGTH: usize = 16;

    /// `salt || iv || tag`, everything before the ciphertext.
    pub const HEADER_LENGTH: usize = SALT_LENGTH + IV_LENGTH + TAG_LENGTH;

    /// Leading byte of a versioned envelope.
    pub const FORMAT_TAG_V1: u8 = 0x01;
}

/// Settings for resolving the master key and writing envelopes.
pub struct KeyConfig {
    /// Encoded master key (64 hex chars or base64 of 32 bytes).
    pub master_key: Option<SecretString>,

    /// Permit a random in-memory key when `master_key` is absent.
    ///
    /// Anything encrypted under such a key is lost when the process exits.
    pub allow_ephemeral_key: bool,

    /// Layout used for newly written envelopes.
    pub envelope_format: EnvelopeFormat,

    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
}

#[derive(Deserialize)]
struct RawKeyConfig {
    master_key: Option<String>,
    #[serde(default)]
    allow_ephemeral_key: bool,
    #[serde(default)]
    envelope_format: EnvelopeFormat,
    #[serde(default = "default_log_level")]
    log_level: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.into()
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            master_key: None,
            allow_ephemeral_key: false,
            envelope_format: EnvelopeFormat::default(),
            log_level: default_log_level(),
        }
    }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyConfig")
            .field(
                "master_key",
                &self.master_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("allow_ephemeral_key", &self.allow_ephemeral_key)
            .field("envelope_format", &self.envelope_format)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl KeyConfig {
    /// Create a configuration around an encoded master key.
    pub fn with_master_key(encoded: impl Into<String>) -> Self {
        Self {
            master_key: Some(SecretString::from(encoded.into())),
            ..Self::default()
        }
    }

    /// Load settings from `FIELD_CRYPT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Load settings from an explicit variable map instead of the process
    /// environment. Keys use the same `FIELD_CRYPT_*` names.
    pub fn from_source(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(Some(vars.into_iter().collect()))
    }

    fn load(source: Option<config::Map<String, String>>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).source(source))
            .build()?;

        let raw: RawKeyConfig = settings.try_deserialize()?;

        Ok(Self {
            master_key: raw
                .master_key
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from),
            allow_ephemeral_key: raw.allow_ephemeral_key,
            envelope_format: raw.envelope_format,
            log_level: raw.log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_layout_constants() {
        assert_eq!(envelope_layout::HEADER_LENGTH, 96);
        assert_eq!(pbkdf2_params::OUTPUT_LENGTH, MASTER_KEY_LENGTH);
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = KeyConfig::from_source(HashMap::new()).unwrap();

        assert!(cfg.master_key.is_none());
        assert!(!cfg.allow_ephemeral_key);
        assert_eq!(cfg.envelope_format, EnvelopeFormat::V1);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_reads_prefixed_variables() {
        let cfg = KeyConfig::from_source(vars(&[
            ("FIELD_CRYPT_MASTER_KEY", "abc123"),
            ("FIELD_CRYPT_ALLOW_EPHEMERAL_KEY", "true"),
            ("FIELD_CRYPT_ENVELOPE_FORMAT", "legacy"),
            ("FIELD_CRYPT_LOG_LEVEL", "debug"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();

        assert_eq!(cfg.master_key.unwrap().expose_secret(), "abc123");
        assert!(cfg.allow_ephemeral_key);
        assert_eq!(cfg.envelope_format, EnvelopeFormat::Legacy);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn test_blank_master_key_is_absent() {
        let cfg = KeyConfig::from_source(vars(&[("FIELD_CRYPT_MASTER_KEY", "   ")])).unwrap();
        assert!(cfg.master_key.is_none());
    }

    #[test]
    fn test_unknown_envelope_format_rejected() {
        let result = KeyConfig::from_source(vars(&[("FIELD_CRYPT_ENVELOPE_FORMAT", "v9")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_master_key() {
        let cfg = KeyConfig::with_master_key("super-secret-key-material");
        let printed = format!("{:?}", cfg);

        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("super-secret"));
    }
}

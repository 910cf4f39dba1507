//! Master key handling and resolution from configuration.

use crate::config::{KeyConfig, MASTER_KEY_LENGTH};
use crate::crypto::random::fill_random;
use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::ExposeSecret;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The process-wide root secret every envelope key is derived from.
///
/// Never persisted next to ciphertext. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key: [u8; MASTER_KEY_LENGTH],
}

impl MasterKey {
    /// Create a master key from raw bytes.
    pub fn from_bytes(key: [u8; MASTER_KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Generate a random master key from the OS CSPRNG.
    pub fn generate() -> Result<Self> {
        let mut key = [0u8; MASTER_KEY_LENGTH];
        fill_random(&mut key)?;
        let master = Self::from_bytes(key);
        key.zeroize();
        Ok(master)
    }

    /// Parse an encoded key: 64 hex characters or standard base64 of 32 bytes.
    pub fn parse(encoded: &str) -> Result<Self> {
        let encoded = encoded.trim();

        let mut bytes = match hex::decode(encoded) {
            Ok(bytes) => bytes,
            Err(_) => STANDARD.decode(encoded).map_err(|_| {
                Error::Configuration("master key is neither hex nor base64".to_string())
            })?,
        };

        if bytes.len() != MASTER_KEY_LENGTH {
            let len = bytes.len();
            bytes.zeroize();
            return Err(Error::Configuration(format!(
                "master key must be {} bytes, got {}",
                MASTER_KEY_LENGTH, len
            )));
        }

        let mut key = [0u8; MASTER_KEY_LENGTH];
        key.copy_from_slice(&bytes);
        bytes.zeroize();
        let master = Self::from_bytes(key);
        key.zeroize();
        Ok(master)
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_LENGTH] {
        &self.key
    }

    /// Encode as lowercase hex, the format [`MasterKey::parse`] reads first.
    pub fn to_hex(&self) -> String {
        hex::encode(self.key)
    }

    /// Encode as standard base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.key)
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterKey([REDACTED])")
    }
}

/// Where the master key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Loaded from configuration; survives restarts.
    Configured,
    /// Generated in memory; data encrypted under it dies with the process.
    Ephemeral,
}

/// Resolves the master key once at startup and hands out shared read-only
/// references to it.
#[derive(Debug, Clone)]
pub struct KeyProvider {
    key: Arc<MasterKey>,
    source: KeySource,
}

impl KeyProvider {
    /// Wrap an already loaded master key.
    pub fn from_key(key: MasterKey) -> Self {
        Self {
            key: Arc::new(key),
            source: KeySource::Configured,
        }
    }

    /// Resolve the master key described by `config`.
    ///
    /// A missing key is a [`Error::Configuration`] unless
    /// `allow_ephemeral_key` is set, in which case a random in-memory key is
    /// used and a warning is logged.
    pub fn from_config(config: &KeyConfig) -> Result<Self> {
        match &config.master_key {
            Some(encoded) => {
                let key = MasterKey::parse(encoded.expose_secret())?;
                info!("master key loaded from configuration");
                Ok(Self::from_key(key))
            }
            None if config.allow_ephemeral_key => Self::ephemeral(),
            None => Err(Error::Configuration(
                "no master key configured; set FIELD_CRYPT_MASTER_KEY".to_string(),
            )),
        }
    }

    /// Use a freshly generated in-memory master key.
    ///
    /// Every envelope written under this key becomes unrecoverable once the
    /// process exits.
    pub fn ephemeral() -> Result<Self> {
        warn!(
            "no master key configured, using an EPHEMERAL in-memory key; \
             data encrypted now cannot be decrypted after restart"
        );
        Ok(Self {
            key: Arc::new(MasterKey::generate()?),
            source: KeySource::Ephemeral,
        })
    }

    /// Shared handle to the master key.
    pub fn master_key(&self) -> Arc<MasterKey> {
        Arc::clone(&self.key)
    }

    /// Where the key came from.
    pub fn source(&self) -> KeySource {
        self.source
    }

    /// Whether the key only lives in this process.
    pub fn is_ephemeral(&self) -> bool {
        self.source == KeySource::Ephemeral
    }
}

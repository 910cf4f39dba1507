//! Error types for field encryption.

use thiserror::Error;

/// Result type alias for field encryption operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while encrypting, decrypting or configuring keys.
///
/// None of the variants ever carry plaintext or key material.
#[derive(Error, Debug)]
pub enum Error {
    /// Master key missing or unusable, or settings could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The CSPRNG, KDF or cipher primitive failed.
    #[error("Crypto primitive failure: {0}")]
    CryptoPrimitive(String),

    /// Authentication tag did not verify.
    #[error("Integrity check failed: envelope was modified or sealed under a different master key")]
    Integrity,

    /// Envelope text is not valid base64, is too short, or the plaintext is not UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Encoding(e.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Configuration(e.to_string())
    }
}

impl Error {
    /// Whether this error means the stored envelope cannot be trusted.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Error::Integrity)
    }
}

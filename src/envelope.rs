//! Binary layout and text encoding of stored envelopes.
//!
//! ```text
//! legacy: salt(64) || iv(16) || tag(16) || ciphertext
//! v1:     0x01 || salt(64) || iv(16) || tag(16) || ciphertext
//! ```
//!
//! The whole byte string is stored as standard padded base64.

use crate::config::envelope_layout::{FORMAT_TAG_V1, HEADER_LENGTH, IV_LENGTH, TAG_LENGTH};
use crate::config::pbkdf2_params::SALT_LENGTH;
use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Byte layout of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeFormat {
    /// Untagged 96-byte header followed by ciphertext.
    Legacy,
    /// One format byte, then the legacy layout.
    #[default]
    V1,
}

impl EnvelopeFormat {
    /// Bytes preceding the ciphertext.
    pub fn header_len(self) -> usize {
        match self {
            EnvelopeFormat::Legacy => HEADER_LENGTH,
            EnvelopeFormat::V1 => 1 + HEADER_LENGTH,
        }
    }
}

/// A decoded envelope: everything needed besides the master key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Layout this envelope was read from or will be written as.
    pub format: EnvelopeFormat,
    /// PBKDF2 salt.
    pub salt: [u8; SALT_LENGTH],
    /// AES-GCM IV.
    pub iv: [u8; IV_LENGTH],
    /// AES-GCM authentication tag.
    pub tag: [u8; TAG_LENGTH],
    /// Encrypted payload.
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Serialize to the stored byte layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        if self.format == EnvelopeFormat::V1 {
            out.push(FORMAT_TAG_V1);
        }
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Length of [`Envelope::to_bytes`].
    pub fn encoded_len(&self) -> usize {
        self.format.header_len() + self.ciphertext.len()
    }

    /// Parse raw bytes, detecting the format from the leading byte.
    ///
    /// Bytes starting with the V1 tag are read as V1 when long enough;
    /// everything else is read with the legacy layout.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let format = match data.first() {
            Some(&FORMAT_TAG_V1) if data.len() >= EnvelopeFormat::V1.header_len() => {
                EnvelopeFormat::V1
            }
            _ => EnvelopeFormat::Legacy,
        };
        Self::from_bytes_as(data, format)
    }

    /// Parse raw bytes with a known layout.
    pub fn from_bytes_as(data: &[u8], format: EnvelopeFormat) -> Result<Self> {
        let body = match format {
            EnvelopeFormat::Legacy => data,
            EnvelopeFormat::V1 => match data.split_first() {
                Some((&FORMAT_TAG_V1, rest)) => rest,
                Some((&other, _)) => {
                    return Err(Error::Encoding(format!(
                        "unknown envelope format tag 0x{:02x}",
                        other
                    )))
                }
                None => return Err(too_short(0, format)),
            },
        };

        if body.len() < HEADER_LENGTH {
            return Err(too_short(data.len(), format));
        }

        let (salt, rest) = body.split_at(SALT_LENGTH);
        let (iv, rest) = rest.split_at(IV_LENGTH);
        let (tag, ciphertext) = rest.split_at(TAG_LENGTH);

        let mut envelope = Envelope {
            format,
            salt: [0u8; SALT_LENGTH],
            iv: [0u8; IV_LENGTH],
            tag: [0u8; TAG_LENGTH],
            ciphertext: ciphertext.to_vec(),
        };
        envelope.salt.copy_from_slice(salt);
        envelope.iv.copy_from_slice(iv);
        envelope.tag.copy_from_slice(tag);
        Ok(envelope)
    }

    /// Encode as base64 text for a single column.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Decode base64 text produced by [`Envelope::encode`].
    pub fn decode(text: &str) -> Result<Self> {
        let data = STANDARD.decode(text.trim())?;
        Self::from_bytes(&data)
    }

    /// The same bytes read with the legacy layout.
    ///
    /// A legacy envelope whose random salt starts with the V1 tag byte is
    /// misdetected as V1; this gives the reader a second interpretation.
    pub fn as_legacy(&self) -> Option<Self> {
        match self.format {
            EnvelopeFormat::Legacy => None,
            EnvelopeFormat::V1 => Self::from_bytes_as(&self.to_bytes(), EnvelopeFormat::Legacy).ok(),
        }
    }
}

fn too_short(len: usize, format: EnvelopeFormat) -> Error {
    Error::Encoding(format!(
        "envelope is {} bytes, minimum is {}",
        len,
        format.header_len()
    ))
}

//! Encrypt/decrypt façade used by business logic.

use crate::config::KeyConfig;
use crate::crypto::{random_array, Cipher, KeyDerivation, KeyProvider, MasterKey};
use crate::envelope::{Envelope, EnvelopeFormat};
use crate::error::{Error, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// Field-level envelope encryption under one master key.
///
/// Cheap to clone and safe to share across threads; every call draws its own
/// salt and IV and derives its own key.
#[derive(Debug, Clone)]
pub struct EncryptionService {
    master_key: Arc<MasterKey>,
    format: EnvelopeFormat,
}

impl EncryptionService {
    /// Create a service that writes V1 envelopes.
    pub fn new(provider: &KeyProvider) -> Self {
        Self {
            master_key: provider.master_key(),
            format: EnvelopeFormat::default(),
        }
    }

    /// Resolve the master key from `config` and honour its envelope format.
    pub fn from_config(config: &KeyConfig) -> Result<Self> {
        let provider = KeyProvider::from_config(config)?;
        Ok(Self::new(&provider).with_format(config.envelope_format))
    }

    /// Change the layout used for newly written envelopes.
    ///
    /// Decryption accepts every layout regardless.
    pub fn with_format(mut self, format: EnvelopeFormat) -> Self {
        self.format = format;
        self
    }

    /// Layout used for newly written envelopes.
    pub fn format(&self) -> EnvelopeFormat {
        self.format
    }

    /// Encrypt an optional string column value.
    ///
    /// `None` and `""` yield `Ok(None)` so callers can store `NULL`.
    pub fn encrypt(&self, plaintext: Option<&str>) -> Result<Option<String>> {
        match plaintext {
            None | Some("") => Ok(None),
            Some(text) => Ok(Some(self.seal(text.as_bytes())?.encode())),
        }
    }

    /// Decrypt an optional stored envelope.
    ///
    /// `None` and `""` yield `Ok(None)`.
    pub fn decrypt(&self, envelope: Option<&str>) -> Result<Option<String>> {
        let text = match envelope {
            None | Some("") => return Ok(None),
            Some(text) => text,
        };

        let envelope = Envelope::decode(text)?;
        let plaintext = self.open_any(&envelope)?;

        String::from_utf8(plaintext)
            .map(Some)
            .map_err(|_| Error::Encoding("decrypted value is not valid UTF-8".to_string()))
    }

    /// Encrypt raw bytes into a fresh envelope.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Envelope> {
        let kdf = KeyDerivation::generate()?;
        let iv = random_array()?;
        let key = kdf.derive_key(&self.master_key);

        let sealed = Cipher::new(&key).encrypt(&iv, plaintext)?;

        let envelope = Envelope {
            format: self.format,
            salt: *kdf.salt(),
            iv,
            tag: sealed.tag,
            ciphertext: sealed.ciphertext,
        };
        debug!(
            format = ?envelope.format,
            len = envelope.encoded_len(),
            "sealed envelope"
        );
        Ok(envelope)
    }

    /// Verify and decrypt an envelope with exactly its recorded layout.
    pub fn open(&self, envelope: &Envelope) -> Result<Vec<u8>> {
        let key = KeyDerivation::from_salt(envelope.salt).derive_key(&self.master_key);
        Cipher::new(&key).decrypt(&envelope.iv, &envelope.tag, &envelope.ciphertext)
    }

    /// Open, retrying a V1 detection as legacy when authentication fails.
    fn open_any(&self, envelope: &Envelope) -> Result<Vec<u8>> {
        match self.open(envelope) {
            Err(Error::Integrity) => match envelope.as_legacy() {
                Some(legacy) => {
                    let plaintext = self.open(&legacy)?;
                    warn!("envelope with leading 0x01 salt byte read as legacy layout");
                    Ok(plaintext)
                }
                None => Err(Error::Integrity),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(byte: u8) -> EncryptionService {
        EncryptionService::new(&KeyProvider::from_key(MasterKey::from_bytes([byte; 32])))
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let svc = service(1);
        let envelope = svc.encrypt(Some("TR330006100519786457841326")).unwrap();

        assert_eq!(
            svc.decrypt(envelope.as_deref()).unwrap().as_deref(),
            Some("TR330006100519786457841326")
        );
    }

    #[test]
    fn test_null_and_empty_pass_through() {
        let svc = service(1);

        assert_eq!(svc.encrypt(None).unwrap(), None);
        assert_eq!(svc.encrypt(Some("")).unwrap(), None);
        assert_eq!(svc.decrypt(None).unwrap(), None);
        assert_eq!(svc.decrypt(Some("")).unwrap(), None);
    }

    #[test]
    fn test_seal_open_bytes() {
        let svc = service(2);
        let envelope = svc.seal(&[0xff, 0x00, 0x10]).unwrap();

        assert_eq!(envelope.format, EnvelopeFormat::V1);
        assert_eq!(svc.open(&envelope).unwrap(), vec![0xff, 0x00, 0x10]);
    }

    #[test]
    fn test_non_utf8_plaintext_is_encoding_error() {
        let svc = service(2);
        let text = svc.seal(&[0xff, 0xfe]).unwrap().encode();

        let result = svc.decrypt(Some(text.as_str()));
        assert!(matches!(result, Err(Error::Encoding(_))));
    }

    #[test]
    fn test_wrong_key_is_integrity_error() {
        let envelope = service(1).encrypt(Some("secret")).unwrap();

        let err = service(2).decrypt(envelope.as_deref()).unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn test_legacy_with_tag_like_salt_still_decrypts() {
        let svc = service(3);

        // Hand-build a legacy envelope whose salt starts with the V1 tag byte.
        let mut salt = [0x5a; 64];
        salt[0] = crate::config::envelope_layout::FORMAT_TAG_V1;
        let iv = [0x07; 16];
        let key = KeyDerivation::from_salt(salt).derive_key(&svc.master_key);
        let sealed = Cipher::new(&key).encrypt(&iv, b"link-password").unwrap();
        let legacy = Envelope {
            format: EnvelopeFormat::Legacy,
            salt,
            iv,
            tag: sealed.tag,
            ciphertext: sealed.ciphertext,
        };

        let text = legacy.encode();
        assert_eq!(Envelope::decode(&text).unwrap().format, EnvelopeFormat::V1);
        assert_eq!(svc.decrypt(Some(text.as_str())).unwrap().as_deref(), Some("link-password"));
    }
}

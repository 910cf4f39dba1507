//! AES-256-GCM authenticated encryption with a 128-bit IV and detached tag.

use crate::config::envelope_layout::{IV_LENGTH, TAG_LENGTH};
use crate::crypto::kdf::DerivedKey;
use crate::error::{Error, Result};
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;

/// AES-256-GCM with a 16-byte nonce, matching the stored envelope layout.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Output of a single encryption.
#[derive(Debug, Clone)]
pub struct Sealed {
    /// Authentication tag over the ciphertext.
    pub tag: [u8; TAG_LENGTH],
    /// Encrypted bytes, same length as the plaintext.
    pub ciphertext: Vec<u8>,
}

/// AES-256-GCM cipher wrapper.
pub struct Cipher {
    cipher: Aes256Gcm16,
}

impl Cipher {
    /// Create a new cipher from a derived key.
    pub fn new(key: &DerivedKey) -> Self {
        let cipher = Aes256Gcm16::new(GenericArray::from_slice(key.as_bytes()));
        Self { cipher }
    }

    /// Encrypt `plaintext` under `iv`, returning the ciphertext and tag
    /// separately.
    pub fn encrypt(&self, iv: &[u8; IV_LENGTH], plaintext: &[u8]) -> Result<Sealed> {
        let mut buffer = plaintext.to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(GenericArray::from_slice(iv), b"", &mut buffer)
            .map_err(|e| Error::CryptoPrimitive(format!("AES-GCM encryption failed: {}", e)))?;

        let mut tag_bytes = [0u8; TAG_LENGTH];
        tag_bytes.copy_from_slice(tag.as_slice());

        Ok(Sealed {
            tag: tag_bytes,
            ciphertext: buffer,
        })
    }

    /// Verify `tag` and decrypt `ciphertext`.
    ///
    /// Any mismatch is reported as [`Error::Integrity`]; no partial
    /// plaintext is ever returned.
    pub fn decrypt(
        &self,
        iv: &[u8; IV_LENGTH],
        tag: &[u8; TAG_LENGTH],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let mut buffer = ciphertext.to_vec();
        self.cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice(iv),
                b"",
                &mut buffer,
                GenericArray::from_slice(tag),
            )
            .map_err(|_| Error::Integrity)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::KeyDerivation;
    use crate::crypto::keys::MasterKey;

    fn test_cipher(master_byte: u8) -> Cipher {
        let master = MasterKey::from_bytes([master_byte; 32]);
        let key = KeyDerivation::from_salt([5u8; 64]).derive_key(&master);
        Cipher::new(&key)
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = test_cipher(1);
        let iv = [3u8; IV_LENGTH];
        let plaintext = b"DE89370400440532013000";

        let sealed = cipher.encrypt(&iv, plaintext).unwrap();
        assert_eq!(sealed.ciphertext.len(), plaintext.len());
        assert_ne!(sealed.ciphertext.as_slice(), plaintext.as_slice());

        let decrypted = cipher.decrypt(&iv, &sealed.tag, &sealed.ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let iv = [3u8; IV_LENGTH];
        let sealed = test_cipher(1).encrypt(&iv, b"Secret data").unwrap();

        let result = test_cipher(2).decrypt(&iv, &sealed.tag, &sealed.ciphertext);
        assert!(matches!(result, Err(Error::Integrity)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let cipher = test_cipher(1);
        let iv = [3u8; IV_LENGTH];
        let mut sealed = cipher.encrypt(&iv, b"Secret data").unwrap();
        sealed.ciphertext[0] ^= 0x01;

        let result = cipher.decrypt(&iv, &sealed.tag, &sealed.ciphertext);
        assert!(matches!(result, Err(Error::Integrity)));
    }

    #[test]
    fn test_tampered_tag_fails() {
        let cipher = test_cipher(1);
        let iv = [3u8; IV_LENGTH];
        let mut sealed = cipher.encrypt(&iv, b"Secret data").unwrap();
        sealed.tag[15] ^= 0x80;

        let result = cipher.decrypt(&iv, &sealed.tag, &sealed.ciphertext);
        assert!(matches!(result, Err(Error::Integrity)));
    }

    #[test]
    fn test_wrong_iv_fails() {
        let cipher = test_cipher(1);
        let sealed = cipher.encrypt(&[3u8; IV_LENGTH], b"Secret data").unwrap();

        let result = cipher.decrypt(&[4u8; IV_LENGTH], &sealed.tag, &sealed.ciphertext);
        assert!(matches!(result, Err(Error::Integrity)));
    }
}

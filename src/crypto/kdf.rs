//! PBKDF2-HMAC-SHA512 derivation of per-envelope keys.

use crate::config::pbkdf2_params;
use crate::crypto::keys::MasterKey;
use crate::crypto::random::random_array;
use crate::error::Result;
use sha2::Sha512;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 256-bit key derived for exactly one envelope.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; pbkdf2_params::OUTPUT_LENGTH],
}

impl DerivedKey {
    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; pbkdf2_params::OUTPUT_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey([REDACTED])")
    }
}

/// Key derivation bound to one salt.
#[derive(Debug, Clone)]
pub struct KeyDerivation {
    salt: [u8; pbkdf2_params::SALT_LENGTH],
}

impl KeyDerivation {
    /// Create a KDF with a fresh random salt (for encryption).
    pub fn generate() -> Result<Self> {
        Ok(Self {
            salt: random_array()?,
        })
    }

    /// Create a KDF from a stored salt (for decryption).
    pub fn from_salt(salt: [u8; pbkdf2_params::SALT_LENGTH]) -> Self {
        Self { salt }
    }

    /// Get the salt for storage.
    pub fn salt(&self) -> &[u8; pbkdf2_params::SALT_LENGTH] {
        &self.salt
    }

    /// Derive the envelope key from the master key.
    ///
    /// The master key bytes are the PBKDF2 password; the iteration count is
    /// [`pbkdf2_params::ITERATIONS`].
    pub fn derive_key(&self, master: &MasterKey) -> DerivedKey {
        let mut key = [0u8; pbkdf2_params::OUTPUT_LENGTH];
        pbkdf2::pbkdf2_hmac::<Sha512>(
            master.as_bytes(),
            &self.salt,
            pbkdf2_params::ITERATIONS,
            &mut key,
        );
        let derived = DerivedKey { key };
        key.zeroize();
        derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derivation_deterministic() {
        let master = MasterKey::from_bytes([9u8; 32]);
        let kdf = KeyDerivation::from_salt([1u8; 64]);

        let key1 = kdf.derive_key(&master);
        let key2 = kdf.derive_key(&master);

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_master_keys_different_keys() {
        let kdf = KeyDerivation::from_salt([2u8; 64]);

        let key1 = kdf.derive_key(&MasterKey::from_bytes([1u8; 32]));
        let key2 = kdf.derive_key(&MasterKey::from_bytes([2u8; 32]));

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_salts_different_keys() {
        let master = MasterKey::from_bytes([3u8; 32]);

        let key1 = KeyDerivation::from_salt([1u8; 64]).derive_key(&master);
        let key2 = KeyDerivation::from_salt([2u8; 64]).derive_key(&master);

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_generate_random_salt() {
        let kdf1 = KeyDerivation::generate().unwrap();
        let kdf2 = KeyDerivation::generate().unwrap();

        assert_ne!(kdf1.salt(), kdf2.salt());
    }

    #[test]
    fn test_uses_fixed_parameters() {
        // Pins the iteration count and output length.
        let master = MasterKey::from_bytes([0u8; 32]);
        let salt = [0u8; 64];
        let mut expected = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha512>(&[0u8; 32], &salt, 100_000, &mut expected);

        let key = KeyDerivation::from_salt(salt).derive_key(&master);
        assert_eq!(key.as_bytes(), &expected);
    }
}

//! Cryptographic primitives for field encryption.
//!
//! This module provides:
//! - Master key loading and the [`KeyProvider`]
//! - PBKDF2-HMAC-SHA512 per-envelope key derivation
//! - AES-256-GCM authenticated encryption with a 128-bit IV

mod cipher;
mod kdf;
mod keys;
mod random;

pub use cipher::{Cipher, Sealed};
pub use kdf::{DerivedKey, KeyDerivation};
pub use keys::{KeyProvider, KeySource, MasterKey};
pub use random::{fill_random, random_array};

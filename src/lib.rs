//! Field-level envelope encryption
//!
//! Protects sensitive column values at rest (national IDs, bank accounts,
//! IBANs, stored credentials) and masks them for display.
//!
//! # Features
//!
//! - **AES-256-GCM**: authenticated encryption with a per-value key
//! - **PBKDF2-HMAC-SHA512**: 100,000-iteration derivation from one master key
//! - **Self-describing envelopes**: salt, IV and tag travel with the ciphertext
//!   in a single base64 value
//! - **Masking**: display redaction for account numbers, IDs, phones and emails
//!
//! # Architecture
//!
//! ```text
//! MasterKey + salt → PBKDF2 → key → AES-256-GCM(iv) → [tag] salt iv tag ct → base64
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use field_crypt::{EncryptionService, KeyConfig};
//!
//! let service = EncryptionService::from_config(&KeyConfig::from_env()?)?;
//!
//! let stored = service.encrypt(Some("DE89370400440532013000"))?;
//! let iban = service.decrypt(stored.as_deref())?;
//! assert_eq!(iban.as_deref(), Some("DE89370400440532013000"));
//!
//! assert_eq!(field_crypt::masking::mask_bank_account("1234567890"), "******7890");
//! # Ok::<(), field_crypt::Error>(())
//! ```

pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod masking;
pub mod service;

pub use config::KeyConfig;
pub use crypto::{KeyProvider, KeySource, MasterKey};
pub use envelope::{Envelope, EnvelopeFormat};
pub use error::{Error, Result};
pub use service::EncryptionService;

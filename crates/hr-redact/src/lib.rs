//! Field-level redaction for flat records.
//!
//! This crate scrubs selected fields of a key/value record before it is
//! logged, stored or transmitted, while keeping two useful properties:
//!
//! - **Digested fields stay comparable**: a digest is a salted SHA-256 with
//!   one fixed salt, so equal values in different records produce equal
//!   digests. This is NOT a password hash.
//! - **Encrypted fields stay recoverable**: AES-256-GCM with a fresh random
//!   IV per value; [`Redactor::decrypt`] reverses [`Redactor::redact`] exactly.
//!
//! # Operations
//!
//! | operation | output |
//! |-----------|--------|
//! | keep      | field untouched |
//! | remove    | field dropped |
//! | digest    | `<key>_digest` = base64(sha256(value + salt)) |
//! | encrypt   | `encrypted_<key>` = ciphertext, `encrypted_<key>_iv` = IV |
//!
//! # Example
//!
//! ```no_run
//! use hr_redact::{EncryptionKey, Operation, Policy, Record, Redactor, RedactorConfig};
//!
//! let policy = Policy::new()
//!     .with("email", Operation::Digest)
//!     .with("ssn", Operation::Remove)
//!     .with("address", Operation::Encrypt);
//! let config = RedactorConfig::new(policy).with_encryption_key(EncryptionKey::generate().unwrap());
//! let redactor = Redactor::new(config);
//!
//! let record: Record = [("email", "george@example.com"), ("address", "22nd St, NY")]
//!     .into_iter()
//!     .collect();
//! let redacted = redactor.redact(&record).unwrap();
//! assert!(redacted.contains_key("email_digest"));
//!
//! let restored = redactor.decrypt(&redacted).unwrap();
//! assert_eq!(restored.get("address"), record.get("address"));
//! ```

pub mod cipher;
pub mod config;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod key;
pub mod key_file;
pub mod operation;
pub mod policy;
pub mod record;
pub mod transform;

pub use cipher::{EncryptionKey, FieldCipher, NonceSource, OsNonceSource, IV_LEN, KEY_LEN};
pub use config::{ConfigOverride, RedactorConfig};
pub use encoding::{Encoding, EncodingSetting};
pub use engine::Redactor;
pub use error::{RedactionError, Result};
pub use key::{FieldKey, KeyKind};
pub use key_file::{KeyFile, KeyFileError};
pub use operation::Operation;
pub use policy::{resolve, FilterMode, Policy};
pub use record::{FieldValue, Record};
pub use transform::{digest_value, FieldTransformer, PassStats, TransformPass};

//! Error types for the redaction engine.
//!
//! Messages name field keys and operations only. Field values, ciphertext
//! and key material never appear in an error.

use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur during redaction or decryption.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RedactionError {
    /// No policy was configured for the call.
    #[error(
        "don't know what to {operation}: configure a redaction policy on the redactor or pass one with the call"
    )]
    MissingPolicy {
        /// The public operation that was attempted (`redact` or `decrypt`).
        operation: &'static str,
    },

    /// An encrypt or decrypt was attempted without an encryption key.
    #[error("no encryption key specified: configure one on the redactor or pass one with the call")]
    MissingEncryptionKey,

    /// A policy entry names an operation outside keep/remove/digest/encrypt.
    #[error("unknown operation on {key}: {operation}")]
    UnknownOperation { key: String, operation: String },

    /// Authenticated decryption rejected the ciphertext/IV pair.
    #[error("decryption failed for field '{key}': ciphertext or iv was tampered with or the key is wrong")]
    DecryptionFailure { key: String },

    /// The cipher refused to encrypt a value.
    #[error("encryption failed for field '{key}'")]
    EncryptionFailure { key: String },

    /// A companion field could not be decoded back into bytes.
    #[error("cannot decode companion field '{key}': {reason}")]
    Decode { key: String, reason: String },

    /// Ciphertext was present but its IV companion was not.
    #[error("field '{key}' has ciphertext but no '{companion}' companion")]
    MissingCompanion { key: String, companion: String },

    /// Invalid encryption key material.
    #[error("key error: {0}")]
    KeyError(String),

    /// The secure random source failed.
    #[error("random source error: {0}")]
    RandomSource(String),
}

//! Authenticated encryption of field values.
//!
//! AES-256-GCM with a fresh 12-byte IV per encrypted value. The IV is drawn
//! from a [`NonceSource`], by default the operating system CSPRNG.

use crate::{FieldKey, RedactionError, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// IV length for AES-GCM (96 bits).
pub const IV_LEN: usize = 12;

/// Key length for AES-256.
pub const KEY_LEN: usize = 32;

/// Symmetric encryption key.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct EncryptionKey {
    key: [u8; KEY_LEN],
}

impl EncryptionKey {
    /// Generate a random key.
    pub fn generate() -> Result<Self> {
        let mut key = [0u8; KEY_LEN];
        getrandom::getrandom(&mut key).map_err(|e| {
            RedactionError::KeyError(format!("failed to generate random key: {}", e))
        })?;
        Ok(Self { key })
    }

    pub fn from_bytes(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Create a key from a slice that must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            RedactionError::KeyError(format!("key must be {} bytes, got {}", KEY_LEN, bytes.len()))
        })?;
        Ok(Self { key })
    }

    /// Create a key from base64-encoded bytes.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| RedactionError::KeyError(format!("invalid base64: {}", e)))?;
        Self::from_slice(&decoded)
    }

    /// Derive a key from a passphrase of any length (SHA-256 of the passphrase).
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&digest);
        Self { key }
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.key)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

impl TryFrom<String> for EncryptionKey {
    type Error = RedactionError;

    fn try_from(encoded: String) -> Result<Self> {
        Self::from_base64(&encoded)
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Source of per-value IVs.
pub trait NonceSource: Send + Sync {
    /// Fill `iv` with fresh unpredictable bytes.
    fn fill_iv(&self, iv: &mut [u8; IV_LEN]) -> Result<()>;
}

/// IVs from the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsNonceSource;

impl NonceSource for OsNonceSource {
    fn fill_iv(&self, iv: &mut [u8; IV_LEN]) -> Result<()> {
        getrandom::getrandom(iv)
            .map_err(|e| RedactionError::RandomSource(format!("failed to generate iv: {}", e)))
    }
}

/// AES-256-GCM bound to one key.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    pub fn new(key: &EncryptionKey) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Encrypt the plaintext of `field` under `iv`. The result carries the GCM tag.
    pub fn encrypt(&self, field: &FieldKey, iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
        self.cipher
            .encrypt(Nonce::from_slice(iv), plaintext)
            .map_err(|_| RedactionError::EncryptionFailure {
                key: field.name().to_string(),
            })
    }

    /// Decrypt and authenticate the ciphertext of `field`.
    ///
    /// A wrong-length IV, a tampered ciphertext or IV, or the wrong key all
    /// fail with [`RedactionError::DecryptionFailure`].
    pub fn decrypt(&self, field: &FieldKey, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let failure = || RedactionError::DecryptionFailure {
            key: field.name().to_string(),
        };
        if iv.len() != IV_LEN {
            return Err(failure());
        }
        self.cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| failure())
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldCipher(aes-256-gcm)")
    }
}

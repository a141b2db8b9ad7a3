//! Encryption key files.
//!
//! A key file is a small JSON document holding base64 key material plus
//! enough metadata to tell keys apart. Files are written with owner-only
//! permissions on Unix.

use crate::{EncryptionKey, RedactionError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Schema version for key files.
pub const KEY_FILE_SCHEMA_VERSION: &str = "1.0.0";

/// Algorithm recorded in key files.
pub const KEY_ALGORITHM: &str = "aes-256-gcm";

/// Errors loading or saving key files.
#[derive(Error, Debug)]
pub enum KeyFileError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error(transparent)]
    Key(#[from] RedactionError),
}

/// On-disk representation of an encryption key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFile {
    /// Schema version for the key file.
    pub schema_version: String,
    /// Algorithm (always aes-256-gcm).
    pub algorithm: String,
    /// When this key was created.
    pub created_at: String,
    /// Base64-encoded key material.
    pub key_material: String,
}

impl KeyFile {
    /// Create a key file around a fresh random key.
    pub fn generate() -> Result<Self, KeyFileError> {
        let key = EncryptionKey::generate()?;
        Ok(Self::from_key(&key))
    }

    pub fn from_key(key: &EncryptionKey) -> Self {
        Self {
            schema_version: KEY_FILE_SCHEMA_VERSION.to_string(),
            algorithm: KEY_ALGORITHM.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            key_material: key.to_base64(),
        }
    }

    /// Decode the key material.
    pub fn key(&self) -> Result<EncryptionKey, KeyFileError> {
        if self.algorithm != KEY_ALGORITHM {
            return Err(KeyFileError::UnsupportedAlgorithm(self.algorithm.clone()));
        }
        Ok(EncryptionKey::from_base64(&self.key_material)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, KeyFileError> {
        let content = std::fs::read_to_string(path)?;
        let file: KeyFile = serde_json::from_str(&content)?;
        Ok(file)
    }

    /// Save with restricted permissions.
    ///
    /// On Unix the file is created with mode 0600 before any content is
    /// written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), KeyFileError> {
        let content = serde_json::to_string_pretty(self)?;

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;

            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(&path, &content)?;
        }

        Ok(())
    }
}

//! Single-field transformations.
//!
//! A [`TransformPass`] owns the working copy of one record. Values are read
//! from the untouched source record and companions are written to the
//! working copy; removals are deferred until [`TransformPass::finish`].

use crate::cipher::{FieldCipher, NonceSource, IV_LEN};
use crate::encoding::encode_value;
use crate::{FieldKey, FieldValue, Operation, Record, RedactorConfig, Result};
use base64::Engine;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Salted SHA-256 of a value's display string, base64 encoded.
///
/// The same salt is used for every value so that digests can be compared
/// across records. This is not a password hash.
pub fn digest_value(value: &FieldValue, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_display_string().as_bytes());
    hasher.update(salt.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

/// Counts of applied operations, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub kept: usize,
    pub removed: usize,
    pub digested: usize,
    pub encrypted: usize,
}

/// Working state of one redaction pass.
#[derive(Debug)]
pub struct TransformPass<'a> {
    source: &'a Record,
    working: Record,
    scheduled: Vec<FieldKey>,
    kept: HashSet<FieldKey>,
    stats: PassStats,
}

impl<'a> TransformPass<'a> {
    pub fn new(source: &'a Record) -> Self {
        Self {
            source,
            working: source.clone(),
            scheduled: Vec::new(),
            kept: HashSet::new(),
            stats: PassStats::default(),
        }
    }

    /// Apply deferred removals and return the transformed record.
    ///
    /// A key marked keep survives even when it was also scheduled for removal.
    pub fn finish(mut self) -> (Record, PassStats) {
        for key in &self.scheduled {
            if !self.kept.contains(key) {
                self.working.remove(key.name());
            }
        }
        (self.working, self.stats)
    }
}

/// Applies one operation to one field.
pub struct FieldTransformer<'a> {
    config: &'a RedactorConfig,
    cipher: Option<FieldCipher>,
    nonces: &'a dyn NonceSource,
}

impl<'a> FieldTransformer<'a> {
    pub fn new(config: &'a RedactorConfig, nonces: &'a dyn NonceSource) -> Self {
        let cipher = config.encryption_key.as_ref().map(FieldCipher::new);
        Self {
            config,
            cipher,
            nonces,
        }
    }

    /// Apply `op` to field `key`. Fields absent from the source are skipped.
    pub fn apply(&self, pass: &mut TransformPass<'_>, key: &FieldKey, op: Operation) -> Result<()> {
        let Some(value) = pass.source.get(key.name()) else {
            return Ok(());
        };

        match op {
            Operation::Keep => {
                pass.kept.insert(key.clone());
                pass.stats.kept += 1;
            }
            Operation::Remove => {
                pass.stats.removed += 1;
            }
            Operation::Digest => {
                let digest = if self.config.digest_empty || !value.is_empty() {
                    FieldValue::Text(digest_value(value, &self.config.digest_salt))
                } else {
                    value.clone()
                };
                pass.working.insert(key.digest_key(), digest);
                pass.stats.digested += 1;
            }
            Operation::Encrypt => {
                let (ciphertext, iv) = self.encrypt(key, value)?;
                pass.working.insert(key.data_key(), ciphertext);
                pass.working.insert(key.iv_key(), iv);
                pass.stats.encrypted += 1;
            }
        }

        if op.removes_original() {
            pass.scheduled.push(key.clone());
        }
        Ok(())
    }

    fn encrypt(&self, key: &FieldKey, value: &FieldValue) -> Result<(FieldValue, FieldValue)> {
        let cipher = self
            .cipher
            .as_ref()
            .ok_or(crate::RedactionError::MissingEncryptionKey)?;

        let mut iv = [0u8; IV_LEN];
        self.nonces.fill_iv(&mut iv)?;
        let ciphertext = cipher.encrypt(key, &iv, &value.plaintext_bytes())?;

        Ok((
            encode_value(ciphertext, self.config.ciphertext_encoding()),
            encode_value(iv.to_vec(), self.config.iv_encoding()),
        ))
    }
}

//! The redactor.
//!
//! [`Redactor::redact`] resolves the policy against a record and applies one
//! operation per field to a private copy. [`Redactor::decrypt`] restores
//! encrypted fields from their companions. Neither call mutates its input,
//! and a failed call returns no partial record.

use crate::cipher::{FieldCipher, NonceSource, OsNonceSource};
use crate::encoding::decode_value;
use crate::policy::resolve;
use crate::transform::{FieldTransformer, TransformPass};
use crate::{
    ConfigOverride, FieldKey, FieldValue, Operation, Record, RedactionError, RedactorConfig,
    Result,
};
use std::borrow::Cow;
use tracing::debug;

/// Field-level redaction engine.
///
/// Holds only configuration; every call works on a clone of its input.
pub struct Redactor {
    config: RedactorConfig,
    nonces: Box<dyn NonceSource>,
}

impl Redactor {
    /// Create a redactor drawing IVs from the OS CSPRNG.
    pub fn new(config: RedactorConfig) -> Self {
        Self::with_nonce_source(config, OsNonceSource)
    }

    /// Create a redactor with an explicit IV source.
    pub fn with_nonce_source(config: RedactorConfig, nonces: impl NonceSource + 'static) -> Self {
        Self {
            config,
            nonces: Box::new(nonces),
        }
    }

    pub fn config(&self) -> &RedactorConfig {
        &self.config
    }

    /// Redact `record` with the instance configuration.
    pub fn redact(&self, record: &Record) -> Result<Record> {
        self.redact_with(record, &ConfigOverride::default())
    }

    /// Redact `record` with `overrides` merged over the instance configuration.
    pub fn redact_with(&self, record: &Record, overrides: &ConfigOverride) -> Result<Record> {
        let config = self.effective(overrides);
        if config.policy.is_empty() {
            return Err(RedactionError::MissingPolicy { operation: "redact" });
        }

        let pairs = resolve(record, &config.policy, config.filter_mode);

        let needs_key = pairs
            .iter()
            .any(|(key, op)| *op == Operation::Encrypt && record.contains_key(key.name()));
        if needs_key && config.encryption_key.is_none() {
            return Err(RedactionError::MissingEncryptionKey);
        }

        let transformer = FieldTransformer::new(&config, self.nonces.as_ref());
        let mut pass = TransformPass::new(record);
        for (key, op) in &pairs {
            transformer.apply(&mut pass, key, *op)?;
        }
        let (result, stats) = pass.finish();

        debug!(
            filter_mode = %config.filter_mode,
            fields_in = record.len(),
            fields_out = result.len(),
            resolved = pairs.len(),
            kept = stats.kept,
            removed = stats.removed,
            digested = stats.digested,
            encrypted = stats.encrypted,
            "record redacted"
        );

        Ok(result)
    }

    /// Decrypt the encrypted fields of `record` with the instance configuration.
    pub fn decrypt(&self, record: &Record) -> Result<Record> {
        self.decrypt_with(record, &ConfigOverride::default())
    }

    /// Decrypt with `overrides` merged over the instance configuration.
    ///
    /// Every policy entry with [`Operation::Encrypt`] whose ciphertext
    /// companion is present is restored as text (or bytes, if the plaintext
    /// is not UTF-8) and its companions are removed. Other entries are
    /// ignored.
    pub fn decrypt_with(&self, record: &Record, overrides: &ConfigOverride) -> Result<Record> {
        let config = self.effective(overrides);
        if config.policy.is_empty() {
            return Err(RedactionError::MissingPolicy { operation: "decrypt" });
        }
        let key = config
            .encryption_key
            .as_ref()
            .ok_or(RedactionError::MissingEncryptionKey)?;
        let cipher = FieldCipher::new(key);

        let mut result = record.clone();
        let mut restored = 0usize;
        for field in config.policy.encrypted_keys() {
            if decrypt_field(&mut result, field, &cipher, &config)? {
                restored += 1;
            }
        }

        debug!(
            fields_in = record.len(),
            fields_out = result.len(),
            restored,
            "record decrypted"
        );

        Ok(result)
    }

    fn effective<'a>(&'a self, overrides: &ConfigOverride) -> Cow<'a, RedactorConfig> {
        if overrides.is_empty() {
            Cow::Borrowed(&self.config)
        } else {
            Cow::Owned(overrides.apply(&self.config))
        }
    }
}

/// Restore one encrypted field in place. Returns whether a ciphertext was found.
fn decrypt_field(
    record: &mut Record,
    field: &FieldKey,
    cipher: &FieldCipher,
    config: &RedactorConfig,
) -> Result<bool> {
    let data_key = field.data_key();
    let iv_key = field.iv_key();

    // The stored companion decides the representation of the restored key.
    let Some(stored) = record.key(data_key.name()) else {
        return Ok(false);
    };
    let restored_key = FieldKey::new(field.name(), stored.kind());

    let ciphertext = record
        .get(data_key.name())
        .map(|v| decode_value(&data_key, v, config.ciphertext_encoding()))
        .transpose()?
        .unwrap_or_default();
    let iv = match record.get(iv_key.name()) {
        Some(v) => decode_value(&iv_key, v, config.iv_encoding())?,
        None => {
            return Err(RedactionError::MissingCompanion {
                key: field.name().to_string(),
                companion: iv_key.name().to_string(),
            })
        }
    };

    let plaintext = cipher.decrypt(field, &iv, &ciphertext)?;

    record.remove(data_key.name());
    record.remove(iv_key.name());
    record.insert(restored_key, FieldValue::from_plaintext(plaintext));
    Ok(true)
}

impl std::fmt::Debug for Redactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Redactor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

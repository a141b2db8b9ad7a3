//! Redactor configuration and per-call overrides.
//!
//! A [`Redactor`](crate::Redactor) owns one [`RedactorConfig`]. Each call may
//! pass a [`ConfigOverride`]; only the fields set on the override replace
//! the instance defaults, and only for that call.

use crate::{Encoding, EncodingSetting, EncryptionKey, FilterMode, Policy};
use serde::Deserialize;

/// Redactor configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedactorConfig {
    /// Field → operation map.
    #[serde(alias = "redact")]
    pub policy: Policy,

    /// Key for encrypt/decrypt (base64 in config files).
    pub encryption_key: Option<EncryptionKey>,

    /// Appended to the stringified value before digesting.
    pub digest_salt: String,

    /// When false, empty values are copied to the digest field unhashed.
    pub digest_empty: bool,

    /// Text encoding of ciphertext.
    pub encode: EncodingSetting,

    /// Text encoding of IVs.
    pub encode_iv: EncodingSetting,

    /// Encoding used when `encode`/`encode_iv` are plain `true`.
    pub default_encoding: Encoding,

    /// Blacklist or whitelist filtering.
    pub filter_mode: FilterMode,
}

impl Default for RedactorConfig {
    fn default() -> Self {
        Self {
            policy: Policy::new(),
            encryption_key: None,
            digest_salt: String::new(),
            digest_empty: true,
            encode: EncodingSetting::Default,
            encode_iv: EncodingSetting::Default,
            default_encoding: Encoding::Base64,
            filter_mode: FilterMode::Blacklist,
        }
    }
}

impl RedactorConfig {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_encryption_key(mut self, key: EncryptionKey) -> Self {
        self.encryption_key = Some(key);
        self
    }

    pub fn with_digest_salt(mut self, salt: impl Into<String>) -> Self {
        self.digest_salt = salt.into();
        self
    }

    pub fn with_digest_empty(mut self, digest_empty: bool) -> Self {
        self.digest_empty = digest_empty;
        self
    }

    pub fn with_encode(mut self, encode: impl Into<EncodingSetting>) -> Self {
        self.encode = encode.into();
        self
    }

    pub fn with_encode_iv(mut self, encode_iv: impl Into<EncodingSetting>) -> Self {
        self.encode_iv = encode_iv.into();
        self
    }

    pub fn with_default_encoding(mut self, encoding: Encoding) -> Self {
        self.default_encoding = encoding;
        self
    }

    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = mode;
        self
    }

    /// Encoding applied to ciphertext, if any.
    pub fn ciphertext_encoding(&self) -> Option<Encoding> {
        self.encode.resolve(self.default_encoding)
    }

    /// Encoding applied to IVs, if any.
    pub fn iv_encoding(&self) -> Option<Encoding> {
        self.encode_iv.resolve(self.default_encoding)
    }
}

/// Per-call configuration override. Unset fields fall back to the instance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigOverride {
    #[serde(alias = "redact")]
    pub policy: Option<Policy>,
    pub encryption_key: Option<EncryptionKey>,
    pub digest_salt: Option<String>,
    pub digest_empty: Option<bool>,
    pub encode: Option<EncodingSetting>,
    pub encode_iv: Option<EncodingSetting>,
    pub default_encoding: Option<Encoding>,
    pub filter_mode: Option<FilterMode>,
}

impl ConfigOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn encryption_key(mut self, key: EncryptionKey) -> Self {
        self.encryption_key = Some(key);
        self
    }

    pub fn digest_salt(mut self, salt: impl Into<String>) -> Self {
        self.digest_salt = Some(salt.into());
        self
    }

    pub fn digest_empty(mut self, digest_empty: bool) -> Self {
        self.digest_empty = Some(digest_empty);
        self
    }

    pub fn encode(mut self, encode: impl Into<EncodingSetting>) -> Self {
        self.encode = Some(encode.into());
        self
    }

    pub fn encode_iv(mut self, encode_iv: impl Into<EncodingSetting>) -> Self {
        self.encode_iv = Some(encode_iv.into());
        self
    }

    pub fn default_encoding(mut self, encoding: Encoding) -> Self {
        self.default_encoding = Some(encoding);
        self
    }

    pub fn filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = Some(mode);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.policy.is_none()
            && self.encryption_key.is_none()
            && self.digest_salt.is_none()
            && self.digest_empty.is_none()
            && self.encode.is_none()
            && self.encode_iv.is_none()
            && self.default_encoding.is_none()
            && self.filter_mode.is_none()
    }

    /// Merge this override over `base`, field by field. `base` is not modified.
    pub fn apply(&self, base: &RedactorConfig) -> RedactorConfig {
        RedactorConfig {
            policy: self.policy.clone().unwrap_or_else(|| base.policy.clone()),
            encryption_key: self
                .encryption_key
                .clone()
                .or_else(|| base.encryption_key.clone()),
            digest_salt: self
                .digest_salt
                .clone()
                .unwrap_or_else(|| base.digest_salt.clone()),
            digest_empty: self.digest_empty.unwrap_or(base.digest_empty),
            encode: self.encode.unwrap_or(base.encode),
            encode_iv: self.encode_iv.unwrap_or(base.encode_iv),
            default_encoding: self.default_encoding.unwrap_or(base.default_encoding),
            filter_mode: self.filter_mode.unwrap_or(base.filter_mode),
        }
    }
}

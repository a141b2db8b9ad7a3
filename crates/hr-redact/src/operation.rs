//! Per-field operations.

use crate::{FieldKey, RedactionError, Result};
use serde::{Deserialize, Serialize};

/// Operation to apply to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Leave the field untouched.
    Keep,
    /// Drop the field.
    #[default]
    Remove,
    /// Replace with a salted SHA-256 digest under `<key>_digest`.
    Digest,
    /// Replace with ciphertext and IV under `encrypted_<key>` / `encrypted_<key>_iv`.
    Encrypt,
}

impl Operation {
    /// Parse an operation name. Accepts a leading `:` so symbol-style
    /// spellings (`:digest`) are treated the same as plain ones.
    pub fn parse_str(s: &str) -> Option<Self> {
        let s = s.strip_prefix(':').unwrap_or(s);
        match s.to_ascii_lowercase().as_str() {
            "keep" => Some(Operation::Keep),
            "remove" => Some(Operation::Remove),
            "digest" => Some(Operation::Digest),
            "encrypt" => Some(Operation::Encrypt),
            _ => None,
        }
    }

    /// Parse the operation configured for `key`.
    ///
    /// An absent operation means [`Operation::Remove`].
    pub fn parse_for(key: &FieldKey, raw: Option<&str>) -> Result<Self> {
        match raw {
            None => Ok(Operation::Remove),
            Some(s) => Self::parse_str(s).ok_or_else(|| RedactionError::UnknownOperation {
                key: key.name().to_string(),
                operation: s.to_string(),
            }),
        }
    }

    /// Whether applying this operation removes the original field.
    pub fn removes_original(&self) -> bool {
        !matches!(self, Operation::Keep)
    }

    /// Whether the operation can be reversed by `decrypt`.
    pub fn is_reversible(&self) -> bool {
        matches!(self, Operation::Encrypt)
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse_str(s).ok_or_else(|| format!("unknown operation: {}", s))
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operation::Keep => "keep",
            Operation::Remove => "remove",
            Operation::Digest => "digest",
            Operation::Encrypt => "encrypt",
        };
        write!(f, "{}", s)
    }
}

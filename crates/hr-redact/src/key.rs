//! Field keys and companion key naming.
//!
//! A key is either a plain string or a symbol-like interned name. Companion
//! keys derived from a field key keep its representation so the keys of a
//! redacted record stay homogeneous with the input's. Equality and hashing
//! look at the name only, so lookups work across representations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::hash::{Hash, Hasher};

const DIGEST_SUFFIX: &str = "_digest";
const ENCRYPTED_PREFIX: &str = "encrypted_";
const IV_SUFFIX: &str = "_iv";

/// Representation of a field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// Raw string key.
    #[default]
    String,
    /// Symbol-like interned key.
    Symbol,
}

/// Identifier of a record field.
#[derive(Debug, Clone, Eq)]
pub struct FieldKey {
    name: String,
    kind: KeyKind,
}

impl FieldKey {
    /// Create a key with an explicit representation.
    pub fn new(name: impl Into<String>, kind: KeyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a raw-string key.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, KeyKind::String)
    }

    /// Create a symbol-like key.
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::new(name, KeyKind::Symbol)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    pub fn is_symbol(&self) -> bool {
        self.kind == KeyKind::Symbol
    }

    /// Key holding the digest of this field: `<name>_digest`.
    pub fn digest_key(&self) -> FieldKey {
        self.derive(format!("{}{}", self.name, DIGEST_SUFFIX))
    }

    /// Key holding the ciphertext of this field: `encrypted_<name>`.
    pub fn data_key(&self) -> FieldKey {
        self.derive(format!("{}{}", ENCRYPTED_PREFIX, self.name))
    }

    /// Key holding the IV used to encrypt this field: `encrypted_<name>_iv`.
    pub fn iv_key(&self) -> FieldKey {
        self.derive(format!("{}{}{}", ENCRYPTED_PREFIX, self.name, IV_SUFFIX))
    }

    fn derive(&self, name: String) -> FieldKey {
        FieldKey::new(name, self.kind)
    }
}

impl PartialEq for FieldKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Hash for FieldKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for FieldKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

// Hash and Eq only consider the name, so str lookups agree with FieldKey lookups.
impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for FieldKey {
    fn from(name: &str) -> Self {
        FieldKey::string(name)
    }
}

impl From<String> for FieldKey {
    fn from(name: String) -> Self {
        FieldKey::string(name)
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for FieldKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(FieldKey::string)
    }
}

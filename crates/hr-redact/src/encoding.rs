//! Binary-to-text encoding of ciphertext and IV companions.

use crate::{FieldKey, FieldValue, RedactionError, Result};
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Text encoding scheme for binary companions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Standard base64 alphabet with padding.
    #[default]
    Base64,
    /// URL-safe base64 alphabet without padding.
    Base64Url,
    /// Lowercase hex.
    Hex,
}

impl Encoding {
    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            Encoding::Base64 => base64::engine::general_purpose::STANDARD.encode(bytes),
            Encoding::Base64Url => base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes),
            Encoding::Hex => hex::encode(bytes),
        }
    }

    pub fn decode(&self, text: &str) -> std::result::Result<Vec<u8>, String> {
        match self {
            Encoding::Base64 => base64::engine::general_purpose::STANDARD
                .decode(text.trim())
                .map_err(|e| format!("invalid base64: {}", e)),
            Encoding::Base64Url => base64::engine::general_purpose::URL_SAFE_NO_PAD
                .decode(text.trim())
                .map_err(|e| format!("invalid base64url: {}", e)),
            Encoding::Hex => hex::decode(text.trim()).map_err(|e| format!("invalid hex: {}", e)),
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base64" | "m" => Ok(Encoding::Base64),
            "base64url" | "base64-url" | "urlsafe" => Ok(Encoding::Base64Url),
            "hex" | "h" => Ok(Encoding::Hex),
            _ => Err(format!("unknown encoding: {}", s)),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Base64 => write!(f, "base64"),
            Encoding::Base64Url => write!(f, "base64url"),
            Encoding::Hex => write!(f, "hex"),
        }
    }
}

/// Whether and how a companion is text-encoded.
///
/// Deserializes from `true`/`false` or an encoding name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingSetting {
    /// Store raw bytes.
    Disabled,
    /// Use the configured default encoding.
    #[default]
    Default,
    /// Use a specific encoding.
    Scheme(Encoding),
}

impl EncodingSetting {
    /// The concrete encoding to use, if any.
    pub fn resolve(&self, default: Encoding) -> Option<Encoding> {
        match self {
            EncodingSetting::Disabled => None,
            EncodingSetting::Default => Some(default),
            EncodingSetting::Scheme(encoding) => Some(*encoding),
        }
    }
}

impl From<bool> for EncodingSetting {
    fn from(enabled: bool) -> Self {
        if enabled {
            EncodingSetting::Default
        } else {
            EncodingSetting::Disabled
        }
    }
}

impl From<Encoding> for EncodingSetting {
    fn from(encoding: Encoding) -> Self {
        EncodingSetting::Scheme(encoding)
    }
}

impl std::str::FromStr for EncodingSetting {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "true" | "yes" | "on" | "default" => Ok(EncodingSetting::Default),
            "false" | "no" | "off" | "none" | "raw" => Ok(EncodingSetting::Disabled),
            other => other.parse::<Encoding>().map(EncodingSetting::Scheme),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawSetting {
    Flag(bool),
    Scheme(Encoding),
}

impl Serialize for EncodingSetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let raw = match self {
            EncodingSetting::Disabled => RawSetting::Flag(false),
            EncodingSetting::Default => RawSetting::Flag(true),
            EncodingSetting::Scheme(encoding) => RawSetting::Scheme(*encoding),
        };
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EncodingSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match RawSetting::deserialize(deserializer)? {
            RawSetting::Flag(flag) => flag.into(),
            RawSetting::Scheme(encoding) => encoding.into(),
        })
    }
}

/// Turn binary output into a field value: text under `encoding`, raw bytes otherwise.
pub fn encode_value(bytes: Vec<u8>, encoding: Option<Encoding>) -> FieldValue {
    match encoding {
        Some(encoding) => FieldValue::Text(encoding.encode(&bytes)),
        None => FieldValue::Bytes(bytes),
    }
}

/// Recover the bytes stored in companion field `key`.
pub fn decode_value(key: &FieldKey, value: &FieldValue, encoding: Option<Encoding>) -> Result<Vec<u8>> {
    let decode_err = |reason: String| RedactionError::Decode {
        key: key.name().to_string(),
        reason,
    };

    match (encoding, value) {
        (Some(encoding), FieldValue::Text(text)) => encoding.decode(text).map_err(decode_err),
        (Some(encoding), _) => Err(decode_err(format!("expected {} text", encoding))),
        (None, FieldValue::Bytes(bytes)) => Ok(bytes.clone()),
        (None, _) => Err(decode_err("expected raw bytes".to_string())),
    }
}

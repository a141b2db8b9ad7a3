//! Configuration file loading and resolution.
//!
//! Resolution order for the config file:
//! 1. Explicit `--config` path
//! 2. `HR_CONFIG` environment variable
//! 3. XDG config directory (`~/.config/hash-redactor/config.toml`, then `config.json`)
//! 4. Built-in defaults (no file)
//!
//! Files ending in `.json` are parsed as JSON, everything else as TOML.

use hr_redact::{
    ConfigOverride, Encoding, EncodingSetting, EncryptionKey, FilterMode, KeyFile, KeyFileError,
    Policy, RedactionError,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a config file.
pub const ENV_CONFIG_PATH: &str = "HR_CONFIG";

/// Application name for XDG directories.
const APP_NAME: &str = "hash-redactor";

const CONFIG_FILENAMES: &[&str] = &["config.toml", "config.json"];

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in config file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid encryption key: {0}")]
    Key(#[from] RedactionError),

    #[error("cannot load key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: KeyFileError,
    },
}

/// Where the config file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    CliArgument,
    Environment,
    XdgConfig,
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Contents of a config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Field → operation map.
    #[serde(alias = "policy")]
    pub redact: Option<Policy>,
    pub digest_salt: Option<String>,
    pub digest_empty: Option<bool>,
    pub encode: Option<EncodingSetting>,
    pub encode_iv: Option<EncodingSetting>,
    pub default_encoding: Option<Encoding>,
    pub filter_mode: Option<FilterMode>,
    /// Base64 key material.
    pub encryption_key: Option<String>,
    /// Path to a key file written by `hr keygen`.
    pub key_file: Option<PathBuf>,
}

impl FileConfig {
    /// Parse a config file, choosing the format from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let mut config: FileConfig = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?
        };

        // Relative key file paths are relative to the config file.
        if let (Some(key_file), Some(dir)) = (config.key_file.as_mut(), path.parent()) {
            if key_file.is_relative() {
                *key_file = dir.join(&*key_file);
            }
        }

        Ok(config)
    }

    /// Resolve the encryption key named by this file, if any.
    pub fn encryption_key(&self) -> Result<Option<EncryptionKey>, ConfigError> {
        if let Some(encoded) = &self.encryption_key {
            return Ok(Some(EncryptionKey::from_base64(encoded)?));
        }
        match &self.key_file {
            Some(path) => load_key_file(path).map(Some),
            None => Ok(None),
        }
    }

    /// Convert to a configuration override. The key is resolved separately.
    pub fn to_override(&self) -> ConfigOverride {
        ConfigOverride {
            policy: self.redact.clone(),
            encryption_key: None,
            digest_salt: self.digest_salt.clone(),
            digest_empty: self.digest_empty,
            encode: self.encode,
            encode_iv: self.encode_iv,
            default_encoding: self.default_encoding,
            filter_mode: self.filter_mode,
        }
    }
}

/// Load the key stored in a key file.
pub fn load_key_file(path: &Path) -> Result<EncryptionKey, ConfigError> {
    KeyFile::load(path)
        .and_then(|file| file.key())
        .map_err(|source| ConfigError::KeyFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Find the config file to use.
///
/// An explicit CLI path is returned even if it does not exist so that the
/// caller reports it; discovered paths must exist.
pub fn resolve_config_path(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        if !env_path.is_empty() {
            return (Some(PathBuf::from(env_path)), ConfigSource::Environment);
        }
    }

    if let Some(dir) = xdg_config_dir() {
        for name in CONFIG_FILENAMES {
            let path = dir.join(name);
            if path.exists() {
                return (Some(path), ConfigSource::XdgConfig);
            }
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

/// Get the XDG config directory for hash-redactor.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

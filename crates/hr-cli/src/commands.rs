//! Subcommand implementations.
//!
//! Configuration is layered: built-in defaults, then the config file, then
//! command-line flags. The encryption key is resolved separately, in the
//! order `--key`, `--key-file`, `HR_ENCRYPTION_KEY`, config file.

use crate::config::{load_key_file, resolve_config_path, ConfigSource, FileConfig};
use crate::error::CliError;
use crate::records::RecordBatch;
use hr_redact::{
    ConfigOverride, Encoding, EncodingSetting, EncryptionKey, FilterMode, KeyFile, Policy,
    Redactor, RedactorConfig,
};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable holding base64 key material.
pub const ENV_ENCRYPTION_KEY: &str = "HR_ENCRYPTION_KEY";

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub key: Option<String>,
    pub key_file: Option<PathBuf>,
}

/// Options for `redact` and `decrypt`.
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    pub input: Option<PathBuf>,
    pub jsonl: bool,
    pub pretty: bool,
    /// `FIELD=OP` pairs; a bare `FIELD` means remove.
    pub policy: Vec<String>,
    pub filter_mode: Option<FilterMode>,
    pub salt: Option<String>,
    pub no_digest_empty: bool,
    pub encode: Option<EncodingSetting>,
    pub encode_iv: Option<EncodingSetting>,
    pub default_encoding: Option<Encoding>,
}

impl RecordOptions {
    /// Flags as a configuration override. Policy flags replace the file policy.
    pub fn to_override(&self) -> Result<ConfigOverride, CliError> {
        let mut overrides = ConfigOverride::new();
        if !self.policy.is_empty() {
            overrides.policy = Some(parse_policy_args(&self.policy)?);
        }
        overrides.filter_mode = self.filter_mode;
        overrides.digest_salt = self.salt.clone();
        if self.no_digest_empty {
            overrides.digest_empty = Some(false);
        }
        overrides.encode = self.encode;
        overrides.encode_iv = self.encode_iv;
        overrides.default_encoding = self.default_encoding;
        Ok(overrides)
    }
}

/// Parse `FIELD=OP` arguments into a policy.
pub fn parse_policy_args(args: &[String]) -> Result<Policy, CliError> {
    let mut pairs = Vec::with_capacity(args.len());
    for arg in args {
        let (field, op) = match arg.split_once('=') {
            Some((field, op)) => (field.trim(), Some(op.trim()).filter(|op| !op.is_empty())),
            None => (arg.trim(), None),
        };
        if field.is_empty() {
            return Err(CliError::Args(format!("policy entry '{}' has no field name", arg)));
        }
        pairs.push((field.to_string(), op.map(str::to_string)));
    }
    Ok(Policy::parse(pairs)?)
}

/// Resolve the encryption key from flags, environment, then config file.
pub fn resolve_key(
    global: &GlobalOptions,
    file: &FileConfig,
) -> Result<Option<EncryptionKey>, CliError> {
    if let Some(encoded) = &global.key {
        debug!(source = "flag", "using encryption key");
        return Ok(Some(EncryptionKey::from_base64(encoded)?));
    }
    if let Some(path) = &global.key_file {
        debug!(source = "key_file", path = %path.display(), "using encryption key");
        return Ok(Some(load_key_file(path)?));
    }
    if let Ok(encoded) = std::env::var(ENV_ENCRYPTION_KEY) {
        if !encoded.is_empty() {
            debug!(source = "environment", "using encryption key");
            return Ok(Some(EncryptionKey::from_base64(&encoded)?));
        }
    }
    Ok(file.encryption_key()?)
}

/// Load the config file selected by flags and environment.
pub fn load_file_config(global: &GlobalOptions) -> Result<FileConfig, CliError> {
    let (path, source) = resolve_config_path(global.config.as_deref());
    match path {
        Some(path) => {
            debug!(path = %path.display(), source = %source, "loading config file");
            Ok(FileConfig::load(&path)?)
        }
        None => {
            debug!(source = %ConfigSource::BuiltinDefault, "no config file");
            Ok(FileConfig::default())
        }
    }
}

/// Build the redactor for a `redact`/`decrypt` run.
pub fn build_redactor(global: &GlobalOptions, options: &RecordOptions) -> Result<Redactor, CliError> {
    let file = load_file_config(global)?;
    let mut config = file.to_override().apply(&RedactorConfig::default());
    config = options.to_override()?.apply(&config);
    config.encryption_key = resolve_key(global, &file)?;
    Ok(Redactor::new(config))
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>, CliError> {
    match path {
        Some(path) if path != Path::new("-") => Ok(Box::new(BufReader::new(File::open(path)?))),
        _ => Ok(Box::new(BufReader::new(std::io::stdin().lock()))),
    }
}

/// `hr redact`: redact every input record to `out`.
pub fn run_redact<W: Write>(
    global: &GlobalOptions,
    options: &RecordOptions,
    out: W,
) -> Result<(), CliError> {
    let redactor = build_redactor(global, options)?;
    let batch = RecordBatch::read(open_input(options.input.as_deref())?, options.jsonl)?;

    let records = batch
        .records
        .iter()
        .map(|record| redactor.redact(record))
        .collect::<Result<Vec<_>, _>>()?;

    info!(records = records.len(), "redacted records");
    batch.derive(records).write(out, options.pretty)
}

/// `hr decrypt`: restore encrypted fields of every input record to `out`.
pub fn run_decrypt<W: Write>(
    global: &GlobalOptions,
    options: &RecordOptions,
    out: W,
) -> Result<(), CliError> {
    let redactor = build_redactor(global, options)?;
    let batch = RecordBatch::read(open_input(options.input.as_deref())?, options.jsonl)?;

    let records = batch
        .records
        .iter()
        .map(|record| redactor.decrypt(record))
        .collect::<Result<Vec<_>, _>>()?;

    info!(records = records.len(), "decrypted records");
    batch.derive(records).write(out, options.pretty)
}

/// `hr keygen`: write a new key file to `output`, or print it to `out`.
pub fn run_keygen<W: Write>(output: Option<&Path>, mut out: W) -> Result<(), CliError> {
    let key_file = KeyFile::generate().map_err(|source| CliError::KeyFile {
        path: output.map(Path::to_path_buf).unwrap_or_default(),
        source,
    })?;

    match output {
        Some(path) => {
            key_file.save(path).map_err(|source| CliError::KeyFile {
                path: path.to_path_buf(),
                source,
            })?;
            info!(path = %path.display(), "wrote key file");
        }
        None => {
            serde_json::to_writer_pretty(&mut out, &key_file)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

//! CLI error type and its mapping onto exit codes.

use crate::config::ConfigError;
use crate::exit_codes::ExitCode;
use hr_redact::{KeyFileError, RedactionError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by `hr` subcommands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid argument: {0}")]
    Args(String),

    #[error("invalid input record {index}: {message}")]
    Input { index: usize, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Redaction(#[from] RedactionError),

    #[error("key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: KeyFileError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Exit code reported for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Args(_) | CliError::Input { .. } => ExitCode::ArgsError,
            CliError::Config(err) => match err {
                ConfigError::Key(_) | ConfigError::KeyFile { .. } => ExitCode::KeyError,
                _ => ExitCode::ConfigError,
            },
            CliError::Redaction(err) => match err {
                RedactionError::MissingPolicy { .. } | RedactionError::UnknownOperation { .. } => {
                    ExitCode::ConfigError
                }
                RedactionError::MissingEncryptionKey | RedactionError::KeyError(_) => {
                    ExitCode::KeyError
                }
                RedactionError::DecryptionFailure { .. }
                | RedactionError::Decode { .. }
                | RedactionError::MissingCompanion { .. } => ExitCode::DecryptError,
                RedactionError::EncryptionFailure { .. } | RedactionError::RandomSource(_) => {
                    ExitCode::InternalError
                }
            },
            CliError::KeyFile { source, .. } => match source {
                KeyFileError::Io(_) => ExitCode::IoError,
                _ => ExitCode::KeyError,
            },
            CliError::Io(_) => ExitCode::IoError,
            CliError::Output(_) => ExitCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction_error_codes() {
        let missing = CliError::from(RedactionError::MissingPolicy { operation: "redact" });
        assert_eq!(missing.exit_code(), ExitCode::ConfigError);

        let no_key = CliError::from(RedactionError::MissingEncryptionKey);
        assert_eq!(no_key.exit_code(), ExitCode::KeyError);

        let tampered = CliError::from(RedactionError::DecryptionFailure {
            key: "address".to_string(),
        });
        assert_eq!(tampered.exit_code(), ExitCode::DecryptError);
    }

    #[test]
    fn test_config_key_errors_are_key_errors() {
        let err = CliError::from(ConfigError::Key(RedactionError::KeyError(
            "bad length".to_string(),
        )));
        assert_eq!(err.exit_code(), ExitCode::KeyError);

        let err = CliError::from(ConfigError::NotFound {
            path: PathBuf::from("/nonexistent.toml"),
        });
        assert_eq!(err.exit_code(), ExitCode::ConfigError);
    }

    #[test]
    fn test_input_errors_are_argument_errors() {
        let err = CliError::Input {
            index: 2,
            message: "nested objects are not supported".to_string(),
        };
        assert_eq!(err.exit_code(), ExitCode::ArgsError);
        assert!(err.to_string().contains("record 2"));
    }
}

//! Command-line front end for `hr-redact`.
//!
//! The `hr` binary redacts and decrypts JSON records and manages key files.
//! This library holds everything except argument parsing so it can be
//! tested without spawning the binary.

pub mod commands;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod records;

pub use commands::{GlobalOptions, RecordOptions};
pub use error::CliError;
pub use exit_codes::ExitCode;

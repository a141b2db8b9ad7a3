//! Exit codes for the `hr` CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors

/// Exit codes for `hr` operations. Stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// All records processed.
    Clean = 0,

    /// Invalid arguments or malformed input records
    ArgsError = 10,

    /// Missing or invalid configuration (no policy, unknown operation, bad config file)
    ConfigError = 11,

    /// Missing or invalid encryption key
    KeyError = 12,

    /// Ciphertext failed authentication or could not be decoded
    DecryptError = 13,

    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Stable name of the code, used in log output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::KeyError => "ERR_KEY",
            ExitCode::DecryptError => "ERR_DECRYPT",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::ArgsError.as_i32(), 10);
        assert_eq!(ExitCode::ConfigError.as_i32(), 11);
        assert_eq!(ExitCode::KeyError.as_i32(), 12);
        assert_eq!(ExitCode::DecryptError.as_i32(), 13);
        assert_eq!(ExitCode::IoError.as_i32(), 21);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::KeyError.to_string(), "ERR_KEY (12)");
    }
}

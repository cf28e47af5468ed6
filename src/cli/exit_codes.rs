//! CLI Exit Codes
//!
//! Standard exit codes for CLI operations and automation.

use crate::config::ConfigError;
use crate::core::transport::TransportError;
use std::process::ExitCode;

/// Exit code constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodes;

impl ExitCodes {
    /// Success
    pub const SUCCESS: u8 = 0;

    /// General error
    pub const ERROR: u8 = 1;

    /// Invalid arguments
    pub const INVALID_ARGS: u8 = 2;

    /// Connection failed
    pub const CONNECTION_FAILED: u8 = 3;

    /// Permission denied
    pub const PERMISSION_DENIED: u8 = 7;

    /// Configuration error
    pub const CONFIG_ERROR: u8 = 8;

    /// Port not found
    pub const PORT_NOT_FOUND: u8 = 14;

    /// Internal error
    pub const INTERNAL_ERROR: u8 = 127;
}

/// CLI operation result
#[derive(Debug)]
pub enum CliResult {
    /// Success with optional message
    Success(Option<String>),

    /// Error with code and message
    Error(u8, String),
}

impl CliResult {
    /// Plain success
    pub fn success() -> Self {
        Self::Success(None)
    }

    /// Success with a message for the user
    pub fn success_with_message(msg: impl Into<String>) -> Self {
        Self::Success(Some(msg.into()))
    }

    /// Failure with an explicit code
    pub fn error(code: u8, msg: impl Into<String>) -> Self {
        Self::Error(code, msg.into())
    }

    /// Classify an error chain into an exit code
    pub fn from_error(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<TransportError>() {
                return Self::Error(transport_code(e), message);
            }
            if cause.downcast_ref::<ConfigError>().is_some() {
                return Self::Error(ExitCodes::CONFIG_ERROR, message);
            }
            if let Some(e) = cause.downcast_ref::<std::io::Error>() {
                return Self::Error(io_code(e), message);
            }
        }
        Self::Error(ExitCodes::ERROR, message)
    }

    /// Get exit code
    pub fn code(&self) -> u8 {
        match self {
            Self::Success(_) => ExitCodes::SUCCESS,
            Self::Error(code, _) => *code,
        }
    }

    /// Get message
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(Some(msg)) | Self::Error(_, msg) => Some(msg),
            Self::Success(None) => None,
        }
    }

    /// Convert to ExitCode
    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    /// Is success?
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

fn transport_code(err: &TransportError) -> u8 {
    match err {
        TransportError::PortNotFound(_) => ExitCodes::PORT_NOT_FOUND,
        TransportError::PermissionDenied(_) => ExitCodes::PERMISSION_DENIED,
        TransportError::Io(e) => io_code(e),
        TransportError::OpenFailed { .. } | TransportError::Disconnected => {
            ExitCodes::CONNECTION_FAILED
        }
    }
}

fn io_code(err: &std::io::Error) -> u8 {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => ExitCodes::PORT_NOT_FOUND,
        ErrorKind::PermissionDenied => ExitCodes::PERMISSION_DENIED,
        ErrorKind::BrokenPipe | ErrorKind::TimedOut => ExitCodes::CONNECTION_FAILED,
        _ => ExitCodes::ERROR,
    }
}

/// Exit code description
pub fn exit_code_description(code: u8) -> &'static str {
    match code {
        0 => "Success",
        1 => "General error",
        2 => "Invalid arguments",
        3 => "Connection failed",
        7 => "Permission denied",
        8 => "Configuration error",
        14 => "Port not found",
        127 => "Internal error",
        _ => "Unknown error",
    }
}

/// Print exit code table
pub fn print_exit_codes() {
    println!("Exit Codes:");
    for code in [0, 1, 2, 3, 7, 8, 14, 127] {
        println!("  {:>3}  {}", code, exit_code_description(code));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_result() {
        let success = CliResult::success();
        assert!(success.is_success());
        assert_eq!(success.code(), 0);
        assert_eq!(success.message(), None);

        let error = CliResult::error(ExitCodes::INVALID_ARGS, "bad hue");
        assert!(!error.is_success());
        assert_eq!(error.code(), 2);
        assert_eq!(error.message(), Some("bad hue"));
    }

    #[test]
    fn test_from_transport_error() {
        let err = anyhow::Error::new(TransportError::PortNotFound("/dev/ttyACM0".into()));
        let result = CliResult::from_error(&err);
        assert_eq!(result.code(), ExitCodes::PORT_NOT_FOUND);
        assert!(result.message().unwrap().contains("/dev/ttyACM0"));
    }

    #[test]
    fn test_from_wrapped_error() {
        let err = anyhow::Error::new(ConfigError::Invalid("baud_rate".into()))
            .context("loading config");
        assert_eq!(CliResult::from_error(&err).code(), ExitCodes::CONFIG_ERROR);

        let err = anyhow::anyhow!("something else");
        assert_eq!(CliResult::from_error(&err).code(), ExitCodes::ERROR);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(exit_code_description(14), "Port not found");
        assert_eq!(exit_code_description(99), "Unknown error");
    }
}

//! gitup - command-line host for extension update checks
//!
//! This crate wires the `gitup-updater` library to:
//! - A TOML configuration file in the platform config directory
//! - An inventory file describing installed plugins and themes
//! - A JSON option store holding the error log
//! - Table, JSON and quiet output modes

pub mod cli;
pub mod config;
pub mod output;

pub use cli::Cli;
pub use config::{CliOverrides, Config};
pub use output::{JsonResponse, OutputFormat, OutputFormatter};

/// Exit codes for CLI operations
///
/// - 0: Success - operation completed successfully
/// - 1: General error - unspecified error occurred
/// - 5: Invalid input - bad arguments, config or inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully (exit code 0)
    Success = 0,
    /// General error (exit code 1)
    GeneralError = 1,
    /// Invalid input provided (exit code 5)
    InvalidInput = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    /// Get the exit code name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::InvalidInput => "INVALID_INPUT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "Operation completed successfully",
            ExitCode::GeneralError => "An unspecified error occurred",
            ExitCode::InvalidInput => "Invalid arguments, configuration or inventory",
        }
    }
}

#[cfg(test)]
mod exit_code_tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success as i32, 0);
        assert_eq!(ExitCode::GeneralError as i32, 1);
        assert_eq!(ExitCode::InvalidInput as i32, 5);
        assert_eq!(i32::from(ExitCode::InvalidInput), 5);
    }

    #[test]
    fn test_exit_code_names() {
        assert_eq!(ExitCode::Success.name(), "SUCCESS");
        assert_eq!(ExitCode::GeneralError.name(), "GENERAL_ERROR");
        assert_eq!(ExitCode::InvalidInput.name(), "INVALID_INPUT");
    }

    #[test]
    fn test_exit_code_descriptions() {
        for code in [ExitCode::Success, ExitCode::GeneralError, ExitCode::InvalidInput] {
            assert!(!code.description().is_empty());
            let _ = code.to_exit_code();
        }
    }
}

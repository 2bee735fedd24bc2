//! Structured error handling and exit codes.

use serde::Serialize;

use crate::actions::DeleteError;
use crate::similarity::FinderError;

/// Exit codes for the simdupe application.
///
/// - 0: Success (similar pairs found, or the command completed)
/// - 1: General error (unexpected failure)
/// - 2: No pairs found (scan completed normally)
/// - 3: Partial success (some files could not be processed)
/// - 4: Invalid input (bad path or threshold)
/// - 5: Not found (delete target missing)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NoPairs = 2,
    PartialSuccess = 3,
    InvalidInput = 4,
    NotFound = 5,
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "SD000",
            Self::GeneralError => "SD001",
            Self::NoPairs => "SD002",
            Self::PartialSuccess => "SD003",
            Self::InvalidInput => "SD004",
            Self::NotFound => "SD005",
            Self::Interrupted => "SD130",
        }
    }

    /// Pick the exit code for an error that reached `main`.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        if let Some(e) = err.downcast_ref::<FinderError>() {
            return match e {
                FinderError::Interrupted => Self::Interrupted,
                FinderError::InvalidThreshold(_)
                | FinderError::PathNotFound(_)
                | FinderError::NotADirectory(_) => Self::InvalidInput,
            };
        }
        if let Some(e) = err.downcast_ref::<DeleteError>() {
            return match e {
                DeleteError::NotFound(_) => Self::NotFound,
                DeleteError::InvalidPath(_) | DeleteError::NotAFile(_) => Self::InvalidInput,
                _ => Self::GeneralError,
            };
        }
        Self::GeneralError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "SD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

/*!
 * Error types for Switchboard
 */

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SplitError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Error, Debug)]
pub enum SplitError {
    /// Input directory does not exist
    #[error("Input directory not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// No input file matched the region filename rules
    #[error("No matching CSV files found in {}", .0.display())]
    NoSourceFiles(PathBuf),

    /// Output directory missing and could not be created
    #[error("Output directory not writable: {}: {source}", .path.display())]
    OutputNotWritable { path: PathBuf, source: io::Error },

    /// File has no readable first line
    #[error("Empty file or unreadable header: {}", .0.display())]
    EmptyInput(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV reader/writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed carrier prefix table
    #[error("Carrier table error at line {line}: {reason}")]
    CarrierTable { line: usize, reason: String },

    /// Worker pool could not be started
    #[error("Failed to create worker pool: {0}")]
    WorkerPool(String),
}

impl SplitError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal_to_run() {
            EXIT_FATAL
        } else {
            EXIT_PARTIAL
        }
    }

    /// Errors that abort the run before any file is processed
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(
            self,
            SplitError::InputNotFound(_)
                | SplitError::NoSourceFiles(_)
                | SplitError::OutputNotWritable { .. }
                | SplitError::Config(_)
                | SplitError::CarrierTable { .. }
                | SplitError::WorkerPool(_)
        )
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            SplitError::InputNotFound(_) | SplitError::NoSourceFiles(_) => ErrorCategory::Discovery,
            SplitError::OutputNotWritable { .. } | SplitError::WorkerPool(_) => {
                ErrorCategory::Resource
            }
            SplitError::EmptyInput(_) => ErrorCategory::Validation,
            SplitError::Io(_) => ErrorCategory::IoError,
            SplitError::Csv(_) => ErrorCategory::Codec,
            SplitError::Config(_) | SplitError::CarrierTable { .. } => {
                ErrorCategory::Configuration
            }
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Input location or file selection
    Discovery,
    /// Output location unavailable
    Resource,
    /// Input content rejected before streaming
    Validation,
    /// I/O operation errors
    IoError,
    /// CSV tokenization errors
    Codec,
    /// Configuration errors
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Discovery => write!(f, "discovery"),
            ErrorCategory::Resource => write!(f, "resource"),
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Codec => write!(f, "codec"),
            ErrorCategory::Configuration => write!(f, "configuration"),
        }
    }
}

impl From<toml::de::Error> for SplitError {
    fn from(err: toml::de::Error) -> Self {
        SplitError::Config(format!("TOML parse error: {}", err))
    }
}

//! CLI-specific error types
//!
//! `CliError` is fatal to the process: bad config, broken stdin/stdout, an
//! unreadable script, or an engine that reported corruption. `DispatchError`
//! is per-command: it is printed and the loop moves on to the next line.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::mvcc::MvccError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file or flag error
    ConfigError,
    /// I/O error (stdin/stdout/script)
    IoError,
    /// The engine reported an unrecoverable error
    EngineFatal,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "MVCC_CLI_CONFIG_ERROR",
            Self::IoError => "MVCC_CLI_IO_ERROR",
            Self::EngineFatal => "MVCC_CLI_ENGINE_FATAL",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Engine failure that ends the session loop
    pub fn engine_fatal(err: &MvccError) -> Self {
        Self::new(
            CliErrorCode::EngineFatal,
            format!("{}: {}", err.code(), err),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::config_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// Failure of a single dispatched command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Known verb, wrong arguments.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// Verb not recognized.
    #[error("command unimplemented: {0}")]
    UnknownCommand(String),

    /// The engine rejected the operation.
    #[error(transparent)]
    Engine(#[from] MvccError),
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::Usage(_) => "MVCC_CLI_USAGE",
            DispatchError::UnknownCommand(_) => "MVCC_CLI_UNKNOWN_COMMAND",
            DispatchError::Engine(err) => err.code(),
        }
    }

    /// Whether the command loop must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DispatchError::Engine(err) if err.is_fatal())
    }
}

//! Defines the application's primary error type `AppError` and a convenience `Result` alias.
//!
//! Uses the `thiserror` crate for ergonomic error definition and provides `From`
//! implementations to convert common external errors into `AppError` variants.
//! Errors that do not implement `Clone` are wrapped in `Arc` to allow `AppError` to be cloneable.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A single piece of installer output that could not be turned into a package record.
///
/// Per-line parse failures are collected next to the records that did parse, so a
/// listing with one odd line still shows everything else.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    /// 1-based line (or array element) number in the raw output.
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// The primary error enumeration for all application-specific errors.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// None of the installer candidates could be started or answered `--version`.
    #[error("Installer not found (tried: {})", .candidates.join(", "))]
    ProcessNotFound { candidates: Vec<String> },

    /// The child ran longer than its bound and was killed.
    #[error("Command timed out after {} seconds: {command}", .timeout.as_secs_f32())]
    ProcessTimeout { command: String, timeout: Duration },

    /// The child exited with a non-zero status.
    #[error("Command failed with exit code {code}: {command}: {stderr}")]
    ProcessFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// The binary exists but the OS refused to start it.
    #[error("Failed to start {command}: {source}")]
    Spawn {
        command: String,
        source: Arc<std::io::Error>,
    },

    /// The installer output as a whole could not be understood.
    #[error("Parse Error: {0}")]
    Parse(#[from] ParseError),

    /// Invalid configuration value.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error related to standard I/O operations.
    #[error("I/O Error: {0}")]
    Io(Arc<std::io::Error>),

    /// Error originating from user interaction prompts (`dialoguer`).
    #[error("Prompt Error: {0}")]
    Prompt(Arc<dialoguer::Error>),

    /// Error related to progress bar style templating (`indicatif`).
    #[error("Progress Style Template Error: {0}")]
    Template(Arc<indicatif::style::TemplateError>),
}

/// A specialized `Result` type using the application's `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// --- From implementations ---
// These allow easy conversion from external error types into AppError
// using the `?` operator. Arc is used for non-Clone error types.

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(Arc::new(err))
    }
}

impl From<dialoguer::Error> for AppError {
    fn from(err: dialoguer::Error) -> Self {
        AppError::Prompt(Arc::new(err))
    }
}

impl From<indicatif::style::TemplateError> for AppError {
    fn from(err: indicatif::style::TemplateError) -> Self {
        AppError::Template(Arc::new(err))
    }
}

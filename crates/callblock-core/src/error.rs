//! Error types for the call blocking core.

use thiserror::Error;

use crate::config::ValidationError;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Modem or device failure.
    #[error("Modem error: {0}")]
    Modem(#[from] callblock_modem::Error),

    /// Configuration could not be located or read.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file is not valid JSON for the expected shape.
    #[error("Configuration parse error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsed but failed validation.
    #[error("Invalid configuration: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    /// The call session failed and must be reset before reuse.
    #[error("Call session failed; reset required")]
    SessionFailed,

    /// The daemon gave up reconnecting.
    #[error("Giving up after {attempts} failed connection attempts")]
    RetriesExhausted {
        /// Consecutive failed attempts.
        attempts: u32,
    },
}

impl Error {
    /// Short machine-friendly name of the error kind, used in log events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Modem(e) => e.kind(),
            Self::Config(_) | Self::Serde(_) | Self::Validation(_) => "config",
            Self::Io(_) => "io_error",
            Self::SessionFailed => "session_failed",
            Self::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::message)
        .collect::<Vec<_>>()
        .join("; ")
}

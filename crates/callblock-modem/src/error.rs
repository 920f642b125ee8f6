//! Error types for modem operations.

use std::io;
use std::time::Duration;

/// Result type alias for modem operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Modem error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The device node could not be opened or configured.
    #[error("Device {path} unavailable: {source}")]
    DeviceUnavailable {
        /// Device path (e.g., `/dev/ttyACM0`).
        path: String,
        /// Underlying serial port error.
        #[source]
        source: tokio_serial::Error,
    },

    /// No complete line arrived before the deadline.
    #[error("Timed out after {0:?} waiting for the modem")]
    Timeout(Duration),

    /// Writing to the device failed.
    #[error("Write error: {0}")]
    Write(#[source] io::Error),

    /// Reading from the device failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The device reported end-of-stream (unplugged or closed).
    #[error("Device closed the connection")]
    Closed,

    /// Initialization was not acknowledged within the retry budget.
    #[error("Modem did not acknowledge {command} after {attempts} attempts")]
    InitFailed {
        /// The command that was never acknowledged.
        command: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// A notification line could not be decoded.
    #[error("Malformed notification: {0}")]
    MalformedNotification(String),

    /// A command was not acknowledged.
    #[error("Modem did not acknowledge {command}")]
    Unacknowledged {
        /// The command that went unanswered.
        command: String,
    },
}

impl Error {
    /// Creates an initialization failure for a command.
    #[must_use]
    pub fn init_failed(command: impl Into<String>, attempts: u32) -> Self {
        Self::InitFailed {
            command: command.into(),
            attempts,
        }
    }

    /// Returns true if the session cannot continue on this channel.
    ///
    /// Fatal errors escalate to the daemon loop, which re-acquires the
    /// device. Timeouts and malformed lines are absorbed by the caller.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Timeout(_) | Self::MalformedNotification(_))
    }

    /// Returns true if this is a read timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Short machine-friendly name of the error kind, used in log events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DeviceUnavailable { .. } => "device_unavailable",
            Self::Timeout(_) => "timeout",
            Self::Write(_) => "write_error",
            Self::Io(_) => "io_error",
            Self::Closed => "closed",
            Self::InitFailed { .. } => "init_failed",
            Self::MalformedNotification(_) => "malformed_notification",
            Self::Unacknowledged { .. } => "unacknowledged",
        }
    }
}

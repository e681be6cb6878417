//! Error types for Linux GPIO operations

use gpiocdev::line::Offset;
use thiserror::Error;

/// Linux GPIO specific errors
#[derive(Debug, Error)]
pub enum LinuxGpioError {
    /// Failed to request a GPIO line
    #[error("Failed to request GPIO line {line} on '{path}': {source}")]
    LineRequestFailed {
        path: String,
        line: Offset,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to set GPIO line value
    #[error("Failed to set GPIO line {line}: {source}")]
    SetValueFailed {
        line: Offset,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to reconfigure a GPIO line
    #[error("Failed to reconfigure GPIO line {line}: {source}")]
    ReconfigureFailed {
        line: Offset,
        #[source]
        source: gpiocdev::Error,
    },

    /// Line written before it was configured as an output
    #[error("GPIO line {0} is not configured as an output")]
    NotOutput(Offset),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl LinuxGpioError {
    /// Line the error refers to, if any
    pub fn line(&self) -> Option<Offset> {
        match self {
            Self::LineRequestFailed { line, .. }
            | Self::SetValueFailed { line, .. }
            | Self::ReconfigureFailed { line, .. }
            | Self::NotOutput(line) => Some(*line),
            Self::InvalidParameter(_) => None,
        }
    }
}

/// Result type for Linux GPIO operations
pub type Result<T> = std::result::Result<T, LinuxGpioError>;

//! Error types for Linux SPI operations

use std::time::Duration;
use thiserror::Error;

use habspi_core::Error as CoreError;

/// Linux SPI specific errors
#[derive(Debug, Error)]
pub enum LinuxSpiError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set SPI mode
    #[error("Failed to set SPI mode to 0x{mode:02X}: {source}")]
    SetModeFailed {
        mode: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set bit order
    #[error("Failed to set LSB-first to {lsb_first}: {source}")]
    SetBitOrderFailed {
        lsb_first: bool,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set bits per word
    #[error("Failed to set bits per word to {bits}: {source}")]
    SetBitsPerWordFailed {
        bits: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set clock speed
    #[error("Failed to set clock speed to {speed} Hz: {source}")]
    SetSpeedFailed {
        speed: u32,
        #[source]
        source: std::io::Error,
    },

    /// SPI transfer failed
    #[error("SPI transfer failed: {0}")]
    TransferFailed(#[source] std::io::Error),

    /// SPI transfer did not finish in time
    #[error("SPI transfer timed out after {0:?}")]
    Timeout(Duration),

    /// A timed-out transfer has not returned from the kernel yet
    #[error("Previous transfer still in flight after a timeout")]
    Stranded,

    /// Could not hand the transfer to a worker thread
    #[error("Failed to start transfer worker: {0}")]
    WorkerFailed(#[source] std::io::Error),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<LinuxSpiError> for CoreError {
    fn from(e: LinuxSpiError) -> Self {
        match e {
            LinuxSpiError::Timeout(_) => CoreError::Timeout,
            _ => CoreError::SpiTransferFailed,
        }
    }
}

/// Result type for Linux SPI operations
pub type Result<T> = std::result::Result<T, LinuxSpiError>;

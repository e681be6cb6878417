//! Error types for habspi-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bus errors
    /// Raw SPI transfer failed
    SpiTransferFailed,
    /// Raw SPI transfer did not complete in time
    Timeout,
    /// Read and write buffers of a transfer differ in length
    LengthMismatch {
        /// Bytes to write
        write: usize,
        /// Bytes to read
        read: usize,
    },

    // Decoder select line errors
    /// Setting a decoder select line direction or level failed
    Gpio {
        /// GPIO line that failed
        line: u32,
    },

    // Precondition violations
    /// Query payload does not fit in one frame
    FrameTooLong(usize),
    /// Memory channel outside 0..=15
    ChannelOutOfRange(u8),
    /// Virtual chip select letter not in A..=D
    InvalidDevice(char),

    // Response errors
    /// Response payload length does not fit in the response frame
    MalformedResponse {
        /// Payload length claimed by the radio
        claimed: u8,
        /// Payload capacity of the frame
        capacity: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiTransferFailed => write!(f, "SPI transfer failed"),
            Self::Timeout => write!(f, "SPI transfer timed out"),
            Self::LengthMismatch { write: w, read } => write!(
                f,
                "transfer buffers differ in length (write {}, read {})",
                w, read
            ),
            Self::Gpio { line } => write!(f, "failed to drive decoder select line {}", line),
            Self::FrameTooLong(len) => {
                write!(f, "query payload of {} bytes exceeds the 22-byte frame", len)
            }
            Self::ChannelOutOfRange(channel) => {
                write!(f, "memory channel {} out of range (0-15)", channel)
            }
            Self::InvalidDevice(c) => {
                write!(f, "invalid virtual chip select '{}' (expected A, B, C or D)", c)
            }
            Self::MalformedResponse { claimed, capacity } => write!(
                f,
                "malformed response: payload length {} exceeds frame capacity {}",
                claimed, capacity
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

//! Raw SPI transfer seam

use crate::error::{Error, Result};

/// Raw full-duplex SPI transfer primitive
///
/// One call is one complete bus session: begin, apply the session
/// settings, clock `write.len()` bytes out while clocking the same number
/// in, end. The native chip select (and with it the decoder enable) is
/// asserted only inside the call.
///
/// Implementations are blocking. The chip-select multiplexer is *not*
/// touched here; callers bracket transfers themselves.
pub trait SpiTransfer {
    /// Exchange `write` for `read`; both must have the same length
    fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<()>;

    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

impl<S: SpiTransfer + ?Sized> SpiTransfer for &mut S {
    fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<()> {
        (**self).transfer(write, read)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

#[cfg(feature = "std")]
impl<S: SpiTransfer + ?Sized> SpiTransfer for std::boxed::Box<S> {
    fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<()> {
        (**self).transfer(write, read)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

/// Reject transfers whose buffers differ in length
pub fn check_lengths(write: &[u8], read: &[u8]) -> Result<()> {
    if write.len() != read.len() {
        return Err(Error::LengthMismatch {
            write: write.len(),
            read: read.len(),
        });
    }
    Ok(())
}

//! GPIO seam for the decoder select lines
//!
//! The multiplexer only ever needs two things from a GPIO driver: make a
//! line an output, and drive it high or low. Backends (Linux gpiocdev, the
//! emulator bench) implement [`DecoderGpio`].

use crate::error::Result;

/// GPIO line number (offset on the GPIO chip, BCM numbering on a Raspberry Pi)
pub type Line = u32;

/// Logic level on a GPIO line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    /// Driven low
    #[default]
    Low,
    /// Driven high
    High,
}

impl Level {
    /// Returns true for [`Level::High`]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// Minimal output-only GPIO driver
pub trait DecoderGpio {
    /// Configure `line` as an output
    fn set_output(&mut self, line: Line) -> Result<()>;

    /// Drive `line` to `level`
    fn write(&mut self, line: Line, level: Level) -> Result<()>;
}

impl<G: DecoderGpio + ?Sized> DecoderGpio for &mut G {
    fn set_output(&mut self, line: Line) -> Result<()> {
        (**self).set_output(line)
    }

    fn write(&mut self, line: Line, level: Level) -> Result<()> {
        (**self).write(line, level)
    }
}

#[cfg(feature = "std")]
impl<G: DecoderGpio + ?Sized> DecoderGpio for std::boxed::Box<G> {
    fn set_output(&mut self, line: Line) -> Result<()> {
        (**self).set_output(line)
    }

    fn write(&mut self, line: Line, level: Level) -> Result<()> {
        (**self).write(line, level)
    }
}

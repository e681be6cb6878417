//! Native SPI bus settings
//!
//! These mirror the knobs of a classic Raspberry Pi SPI session
//! (bit order, data mode, clock divider, chip select and its polarity).
//! Backends apply them when a session is opened.

/// Bit order on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// Most significant bit first
    #[default]
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

/// SPI data mode (clock polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0: clock idle low, data sampled on the first edge
    #[default]
    Mode0 = 0,
    /// CPOL=0, CPHA=1
    Mode1 = 1,
    /// CPOL=1, CPHA=0
    Mode2 = 2,
    /// CPOL=1, CPHA=1
    Mode3 = 3,
}

impl SpiMode {
    /// Mode number as used by spidev
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Mode from its number (0-3)
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Mode0),
            1 => Some(Self::Mode1),
            2 => Some(Self::Mode2),
            3 => Some(Self::Mode3),
            _ => None,
        }
    }
}

/// Native chip select line of the host controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NativeChipSelect {
    /// CE0, wired to the decoder enable
    #[default]
    Cs0,
    /// CE1
    Cs1,
}

impl NativeChipSelect {
    /// Index used in `/dev/spidevB.C`
    pub const fn index(self) -> u8 {
        match self {
            Self::Cs0 => 0,
            Self::Cs1 => 1,
        }
    }
}

/// Active level of the native chip select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsPolarity {
    /// Asserted low (74HC139 G input is active low)
    #[default]
    ActiveLow,
    /// Asserted high
    ActiveHigh,
}

/// Core clock the BCM2835 SPI divider works from
pub const CORE_CLOCK_HZ: u32 = 250_000_000;

/// Clock divider used for the radio (~61 kHz)
pub const RADIO_CLOCK_DIVIDER: u32 = 4096;

/// Full set of session settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiSettings {
    /// Bit order
    pub bit_order: BitOrder,
    /// Data mode
    pub mode: SpiMode,
    /// Divider applied to [`CORE_CLOCK_HZ`]
    pub clock_divider: u32,
    /// Native chip select used for the session
    pub chip_select: NativeChipSelect,
    /// Native chip select polarity
    pub cs_polarity: CsPolarity,
}

impl SpiSettings {
    /// Settings the radio (and the decoder enable wiring) needs
    pub const RADIO: Self = Self {
        bit_order: BitOrder::MsbFirst,
        mode: SpiMode::Mode0,
        clock_divider: RADIO_CLOCK_DIVIDER,
        chip_select: NativeChipSelect::Cs0,
        cs_polarity: CsPolarity::ActiveLow,
    };

    /// Resulting SCLK frequency in Hz
    pub const fn speed_hz(&self) -> u32 {
        if self.clock_divider == 0 {
            CORE_CLOCK_HZ
        } else {
            CORE_CLOCK_HZ / self.clock_divider
        }
    }

    /// Use the divider closest to (not faster than) `speed_hz`
    pub const fn with_speed_hz(mut self, speed_hz: u32) -> Self {
        self.clock_divider = if speed_hz == 0 {
            RADIO_CLOCK_DIVIDER
        } else {
            CORE_CLOCK_HZ.div_ceil(speed_hz)
        };
        self
    }
}

impl Default for SpiSettings {
    fn default() -> Self {
        Self::RADIO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radio_settings() {
        let s = SpiSettings::RADIO;
        assert_eq!(s.bit_order, BitOrder::MsbFirst);
        assert_eq!(s.mode, SpiMode::Mode0);
        assert_eq!(s.chip_select, NativeChipSelect::Cs0);
        assert_eq!(s.cs_polarity, CsPolarity::ActiveLow);
        assert_eq!(s.speed_hz(), 61_035);
    }

    #[test]
    fn test_speed_to_divider() {
        let s = SpiSettings::RADIO.with_speed_hz(39_062);
        assert_eq!(s.clock_divider, 6401);
        assert!(s.speed_hz() <= 39_062);
        assert_eq!(SpiSettings::RADIO.with_speed_hz(0).clock_divider, 4096);
    }

    #[test]
    fn test_mode_bits() {
        for bits in 0..4 {
            assert_eq!(SpiMode::from_bits(bits).map(SpiMode::bits), Some(bits));
        }
        assert_eq!(SpiMode::from_bits(4), None);
    }
}

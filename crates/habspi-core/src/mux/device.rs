//! Virtual device identifiers and the 74HC139 select table

use crate::error::Error;
use crate::gpio::{Level, Line};
use core::fmt;
use core::str::FromStr;

/// Default decoder A input: GPIO24 (header pin 18 on a Raspberry Pi rev2)
pub const DEFAULT_PIN_A: Line = 24;

/// Default decoder B input: GPIO25 (header pin 22 on a Raspberry Pi rev2)
pub const DEFAULT_PIN_B: Line = 25;

/// One of the four decoder outputs (Y0..Y3), i.e. one virtual chip select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VirtualDeviceId {
    /// Decoder output Y0
    #[default]
    A,
    /// Decoder output Y1 (the radio on the HAB main board)
    B,
    /// Decoder output Y2
    C,
    /// Decoder output Y3
    D,
}

impl VirtualDeviceId {
    /// All virtual devices, in decoder output order
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Select pattern that routes the decoder enable to this device
    pub const fn pattern(self) -> SelectPattern {
        match self {
            Self::A => SelectPattern::new(Level::Low, Level::Low),
            Self::B => SelectPattern::new(Level::High, Level::Low),
            Self::C => SelectPattern::new(Level::Low, Level::High),
            Self::D => SelectPattern::new(Level::High, Level::High),
        }
    }

    /// Decoder output index (0 for Y0 ... 3 for Y3)
    pub const fn output(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    /// Device letter
    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }

    /// Parse a device letter, case-insensitive
    pub fn from_letter(c: char) -> Result<Self, Error> {
        match c.to_ascii_uppercase() {
            'A' => Ok(Self::A),
            'B' => Ok(Self::B),
            'C' => Ok(Self::C),
            'D' => Ok(Self::D),
            _ => Err(Error::InvalidDevice(c)),
        }
    }
}

impl fmt::Display for VirtualDeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CS{}", self.letter())
    }
}

impl FromStr for VirtualDeviceId {
    type Err = Error;

    /// Accepts `B`, `b`, `csb` or `CSB`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let letters = match s.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("cs") => &s[2..],
            _ => s,
        };
        let mut chars = letters.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_letter(c),
            (Some(c), Some(_)) => Err(Error::InvalidDevice(c)),
            (None, _) => Err(Error::InvalidDevice(' ')),
        }
    }
}

/// Levels for the decoder (A, B) inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SelectPattern {
    /// Level on decoder input A
    pub a: Level,
    /// Level on decoder input B
    pub b: Level,
}

impl SelectPattern {
    /// Pattern written on release: both inputs low
    pub const RELEASED: Self = Self::new(Level::Low, Level::Low);

    /// Create a pattern
    pub const fn new(a: Level, b: Level) -> Self {
        Self { a, b }
    }

    /// Decoder output this pattern routes the enable to
    pub const fn device(self) -> VirtualDeviceId {
        match (self.a, self.b) {
            (Level::Low, Level::Low) => VirtualDeviceId::A,
            (Level::High, Level::Low) => VirtualDeviceId::B,
            (Level::Low, Level::High) => VirtualDeviceId::C,
            (Level::High, Level::High) => VirtualDeviceId::D,
        }
    }
}

/// GPIO lines wired to the decoder select inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoderSelectPins {
    /// Line driving decoder input A
    pub a: Line,
    /// Line driving decoder input B
    pub b: Line,
}

impl DecoderSelectPins {
    /// Create a pin assignment
    pub const fn new(a: Line, b: Line) -> Self {
        Self { a, b }
    }
}

impl Default for DecoderSelectPins {
    fn default() -> Self {
        Self::new(DEFAULT_PIN_A, DEFAULT_PIN_B)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_table() {
        assert_eq!(
            VirtualDeviceId::A.pattern(),
            SelectPattern::new(Level::Low, Level::Low)
        );
        assert_eq!(
            VirtualDeviceId::B.pattern(),
            SelectPattern::new(Level::High, Level::Low)
        );
        assert_eq!(
            VirtualDeviceId::C.pattern(),
            SelectPattern::new(Level::Low, Level::High)
        );
        assert_eq!(
            VirtualDeviceId::D.pattern(),
            SelectPattern::new(Level::High, Level::High)
        );
    }

    #[test]
    fn test_pattern_is_bijection() {
        for id in VirtualDeviceId::ALL {
            assert_eq!(id.pattern().device(), id);
        }
    }

    #[test]
    fn test_parse_device() {
        assert_eq!("B".parse::<VirtualDeviceId>(), Ok(VirtualDeviceId::B));
        assert_eq!("d".parse::<VirtualDeviceId>(), Ok(VirtualDeviceId::D));
        assert_eq!("csc".parse::<VirtualDeviceId>(), Ok(VirtualDeviceId::C));
        assert_eq!("CSA".parse::<VirtualDeviceId>(), Ok(VirtualDeviceId::A));
        assert_eq!(
            "e".parse::<VirtualDeviceId>(),
            Err(Error::InvalidDevice('e'))
        );
        assert!("".parse::<VirtualDeviceId>().is_err());
        assert!("AB".parse::<VirtualDeviceId>().is_err());
    }
}

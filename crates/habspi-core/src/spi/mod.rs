//! SPI bus types
//!
//! This module provides the session settings and the raw transfer trait
//! that bus backends implement.

mod settings;
mod traits;

pub use settings::{
    BitOrder, CsPolarity, NativeChipSelect, SpiMode, SpiSettings, CORE_CLOCK_HZ,
    RADIO_CLOCK_DIVIDER,
};
pub use traits::{check_lengths, SpiTransfer};

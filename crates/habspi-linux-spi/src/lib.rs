//! habspi-linux-spi - Linux spidev transfer backend
//!
//! This crate implements the raw SPI transfer primitive over the
//! `/dev/spidevX.Y` device interface. The native chip select of the
//! spidev node drives the decoder enable, so it is asserted only for the
//! duration of each transfer.
//!
//! # Example
//!
//! ```no_run
//! use habspi_linux_spi::{LinuxSpi, LinuxSpiConfig};
//! use habspi_core::spi::SpiTransfer;
//!
//! // Radio settings: MSB first, mode 0, ~61 kHz, CS0 active low
//! let mut spi = LinuxSpi::open(&LinuxSpiConfig::default())?;
//!
//! let mut rx = [0u8; 4];
//! spi.transfer(b"****", &mut rx)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the habspi CLI
//!
//! ```bash
//! habspi -p linux:spidev=/dev/spidev0.0,spispeed=39,timeout=500 name
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y`

pub mod device;
pub mod error;

pub use device::{parse_options, LinuxSpi, LinuxSpiConfig, DEFAULT_TIMEOUT, OPTION_KEYS};
pub use error::{LinuxSpiError, Result};

/// Open a Linux SPI device and return a boxed transfer backend
///
/// # Example Options
///
/// - `spidev=/dev/spidev0.0` - Optional: device path (default: `/dev/spidev0.0`)
/// - `spispeed=61` - Optional: speed in kHz (default: core clock / 4096)
/// - `mode=0` - Optional: SPI mode 0-3 (default: 0)
/// - `timeout=1000` - Optional: transfer timeout in ms, 0 disables (default: 1000)
pub fn open_linux_spi(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn habspi_core::spi::SpiTransfer>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    let spi = LinuxSpi::open(&config)?;
    Ok(Box::new(spi))
}

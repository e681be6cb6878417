//! habspi-linux-gpio - Linux GPIO backend for the decoder select lines
//!
//! This crate drives the two 74HC139 select inputs through the Linux GPIO
//! character device interface (gpiocdev), the replacement for the
//! deprecated sysfs interface.
//!
//! # Example
//!
//! ```no_run
//! use habspi_core::mux::{ChipSelectMux, DecoderSelectPins, VirtualDeviceId};
//! use habspi_linux_gpio::{LinuxGpio, LinuxGpioConfig};
//!
//! let gpio = LinuxGpio::open(&LinuxGpioConfig::new("/dev/gpiochip0"))?;
//! let mux = ChipSelectMux::with_config(gpio, DecoderSelectPins::new(24, 25), VirtualDeviceId::B)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Wiring
//!
//! | 74HC139 pin | Connected to           |
//! |-------------|------------------------|
//! | 1A          | select line A (GPIO24) |
//! | 1B          | select line B (GPIO25) |
//! | 1G          | native CS0             |
//! | 1Y0..1Y3    | CSA..CSD               |
//!
//! # System Requirements
//!
//! - Linux kernel 4.8+ with GPIO character device support
//! - Access to `/dev/gpiochipN` devices (may require root or udev rules)

pub mod device;
pub mod error;

pub use device::{parse_options, LinuxGpio, LinuxGpioConfig, DEFAULT_CHIP, OPTION_KEYS};
pub use error::{LinuxGpioError, Result};

/// Open the GPIO chip and return a boxed decoder GPIO driver
///
/// # Example Options
///
/// - `gpiochip=0` - Optional: chip number or path (default: `/dev/gpiochip0`)
pub fn open_linux_gpio(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn habspi_core::gpio::DecoderGpio>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    let gpio = LinuxGpio::open(&config)?;
    Ok(Box::new(gpio))
}

//! habspi-core - Virtual chip-select SPI radio control
//!
//! The HAB main board gives its Raspberry Pi four SPI chip selects
//! although the BCM2835 only has two. Two GPIO lines feed the A/B inputs
//! of a 74HC139 2-to-4 line decoder whose enable is wired to CE0; whichever
//! output the A/B pattern points at goes low for exactly as long as CE0 is
//! asserted during a transfer.
//!
//! This crate contains the hardware-independent parts:
//!
//! - [`mux`] - the chip-select multiplexer and its scoped select guard
//! - [`radio`] - the SRB-MX146LV command framing and protocol driver
//! - [`gpio`] and [`spi`] - the seams that GPIO and SPI backends implement
//!
//! It is designed to be `no_std` compatible.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` and boxed bus forwarding
//!
//! # Example
//!
//! ```ignore
//! use habspi_core::mux::{ChipSelectMux, DecoderSelectPins, VirtualDeviceId};
//! use habspi_core::radio::Radio;
//!
//! let mux = ChipSelectMux::with_config(gpio, DecoderSelectPins::default(), VirtualDeviceId::B)?;
//! let mut radio = Radio::new(mux, spi);
//! println!("{}", radio.device_name()?);
//! radio.set_frequency(144_390_000)?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod gpio;
pub mod mux;
pub mod radio;
pub mod spi;

pub use error::{Error, Result};

//! Programmer registration and dispatch
//!
//! A programmer is a pair of backends: one drives the decoder select lines,
//! the other performs raw SPI transfers. This module maps a programmer
//! string to those backends and wires them into a [`Radio`].

use std::collections::HashMap;

use habspi_core::gpio::DecoderGpio;
use habspi_core::mux::{ChipSelectMux, DecoderSelectPins, VirtualDeviceId};
use habspi_core::radio::Radio;
use habspi_core::spi::SpiTransfer;
use thiserror::Error;

/// Radio driver over boxed backends
pub type RadioHandle = Radio<ChipSelectMux<Box<dyn DecoderGpio>>, Box<dyn SpiTransfer>>;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Errors raised while selecting a programmer
#[derive(Debug, Error)]
pub enum ProgrammerError {
    /// Programmer name not known or not compiled in
    #[error("Unknown programmer: {name}\n\n{help}\nUse 'habspi list-programmers' for more details")]
    Unknown { name: String, help: String },

    /// Malformed programmer string
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    InvalidParameter(String),
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(all(feature = "linux-spi", feature = "linux-gpio"))]
    programmers.push(ProgrammerInfo {
        name: "linux",
        aliases: &["rpi"],
        description: "spidev + GPIO chardev (spidev=<path>,gpiochip=<n|path>,spispeed=<kHz>,timeout=<ms>)",
    });

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "Emulated decoder and radio for testing (radio=<A-D>,loopback=<A-D>)",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with backend features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:8} - {}\n", p.name, p.description));
    }
    help
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Resolve a name or alias to the primary programmer name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Parsed programmer parameters
#[derive(Debug)]
pub struct ProgrammerParams {
    /// Programmer name as given
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

impl ProgrammerParams {
    /// Parameters as borrowed pairs, optionally filtered by key
    pub fn options<'a>(&'a self, keep: impl Fn(&str) -> bool) -> Vec<(&'a str, &'a str)> {
        let mut options: Vec<_> = self
            .params
            .iter()
            .filter(|(k, _)| keep(k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        options.sort_unstable();
        options
    }
}

/// Parse a programmer string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_programmer_params(s: &str) -> Result<ProgrammerParams, ProgrammerError> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            let (key, value) = opt
                .split_once('=')
                .ok_or_else(|| ProgrammerError::InvalidParameter(opt.to_string()))?;
            params.insert(key.to_string(), value.to_string());
        }
    }

    Ok(ProgrammerParams {
        name: name.to_string(),
        params,
    })
}

/// Open a programmer and wire a radio driver on top of it
///
/// The multiplexer is configured on `pins` and targets `device`.
pub fn open_radio(
    programmer: &str,
    pins: DecoderSelectPins,
    device: VirtualDeviceId,
) -> Result<RadioHandle, Box<dyn std::error::Error>> {
    let (gpio, spi) = open_backends(programmer, pins)?;
    let mux = ChipSelectMux::with_config(gpio, pins, device)?;
    log::info!(
        "Using {} (decoder A=GPIO{}, B=GPIO{})",
        device,
        pins.a,
        pins.b
    );
    Ok(Radio::new(mux, spi))
}

type Backends = (Box<dyn DecoderGpio>, Box<dyn SpiTransfer>);

#[allow(unused_variables)]
fn open_backends(
    programmer: &str,
    pins: DecoderSelectPins,
) -> Result<Backends, Box<dyn std::error::Error>> {
    let params = parse_programmer_params(programmer)?;

    match find_programmer(&params.name) {
        #[cfg(all(feature = "linux-spi", feature = "linux-gpio"))]
        Some("linux") => open_linux(&params),

        #[cfg(feature = "dummy")]
        Some("dummy") => {
            let options = params.options(|_| true);
            habspi_dummy::open_dummy(&options, pins)
        }

        _ => Err(ProgrammerError::Unknown {
            name: params.name.clone(),
            help: programmer_help(),
        }
        .into()),
    }
}

#[cfg(all(feature = "linux-spi", feature = "linux-gpio"))]
fn open_linux(params: &ProgrammerParams) -> Result<Backends, Box<dyn std::error::Error>> {
    let is_gpio_key = |k: &str| habspi_linux_gpio::OPTION_KEYS.contains(&k);

    log::info!("Opening Linux spidev + GPIO programmer...");

    let gpio = habspi_linux_gpio::open_linux_gpio(&params.options(is_gpio_key))
        .map_err(|e| format!("Invalid linux GPIO setup: {}", e))?;
    let spi = habspi_linux_spi::open_linux_spi(&params.options(|k| !is_gpio_key(k))).map_err(
        |e| {
            format!(
                "Failed to open Linux SPI device: {}\n\
                 Make sure the device exists and you have read/write permissions.\n\
                 You may need to: sudo usermod -aG spi $USER",
                e
            )
        },
    )?;

    Ok((gpio, spi))
}

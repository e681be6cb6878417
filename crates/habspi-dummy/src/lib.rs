//! habspi-dummy - Emulated decoder bench for testing
//!
//! This crate emulates the HAB main board SPI wiring in memory: a 74HC139
//! decoder fed by two GPIO lines, an SRB-MX146LV radio on one of its
//! outputs and, optionally, a loopback device on another. It's useful for
//! testing and development without real hardware.
//!
//! [`DummyGpio`] and [`DummySpi`] share one [`DummyBench`], so a transfer
//! reaches whichever output the select lines point at when it starts.

pub mod radio;

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use habspi_core::error::{Error, Result};
use habspi_core::gpio::{DecoderGpio, Level, Line};
use habspi_core::mux::{DecoderSelectPins, SelectPattern, VirtualDeviceId};
use habspi_core::spi::{check_lengths, SpiTransfer};

pub use radio::{DummyRadio, RadioConfig};

/// Configuration for the emulated bench
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Decoder output the radio is wired to
    pub radio: VirtualDeviceId,
    /// Decoder output that echoes every byte back, if any
    pub loopback: Option<VirtualDeviceId>,
    /// GPIO lines wired to the decoder select inputs
    pub pins: DecoderSelectPins,
    /// Emulated radio
    pub radio_config: RadioConfig,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            radio: VirtualDeviceId::B,
            loopback: None,
            pins: DecoderSelectPins::default(),
            radio_config: RadioConfig::default(),
        }
    }
}

/// One transfer as seen on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusTransfer {
    /// Decoder output that was enabled
    pub device: VirtualDeviceId,
    /// Bytes clocked out
    pub write: Vec<u8>,
}

struct BenchState {
    config: DummyConfig,
    outputs: Vec<Line>,
    levels: Vec<(Line, Level)>,
    radio: DummyRadio,
    transfers: Vec<BusTransfer>,
    fail_line: Option<Line>,
}

impl BenchState {
    fn level(&self, line: Line) -> Level {
        self.levels
            .iter()
            .find(|(l, _)| *l == line)
            .map(|(_, level)| *level)
            .unwrap_or_default()
    }

    fn decoded(&self) -> VirtualDeviceId {
        let pins = self.config.pins;
        for line in [pins.a, pins.b] {
            if !self.outputs.contains(&line) {
                log::warn!("dummy: Decoder input GPIO{} is floating, reading low", line);
            }
        }
        SelectPattern::new(self.level(pins.a), self.level(pins.b)).device()
    }
}

/// Shared emulated hardware
#[derive(Clone)]
pub struct DummyBench {
    state: Rc<RefCell<BenchState>>,
}

impl DummyBench {
    /// Build a bench with the given wiring
    pub fn new(config: DummyConfig) -> Self {
        let radio = DummyRadio::new(config.radio_config.clone());
        Self {
            state: Rc::new(RefCell::new(BenchState {
                config,
                outputs: Vec::new(),
                levels: Vec::new(),
                radio,
                transfers: Vec::new(),
                fail_line: None,
            })),
        }
    }

    /// Build a bench with the radio on CSB and default pins
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// GPIO driver wired to this bench
    pub fn gpio(&self) -> DummyGpio {
        DummyGpio {
            state: self.state.clone(),
        }
    }

    /// SPI bus wired to this bench
    pub fn spi(&self) -> DummySpi {
        DummySpi {
            state: self.state.clone(),
        }
    }

    /// Current level of a GPIO line (undriven lines read low)
    pub fn level(&self, line: Line) -> Level {
        self.state.borrow().level(line)
    }

    /// Decoder output the select lines currently point at
    pub fn decoded_device(&self) -> VirtualDeviceId {
        self.state.borrow().decoded()
    }

    /// The emulated radio
    pub fn radio(&self) -> Ref<'_, DummyRadio> {
        Ref::map(self.state.borrow(), |s| &s.radio)
    }

    /// Every transfer so far
    pub fn transfers(&self) -> Vec<BusTransfer> {
        self.state.borrow().transfers.clone()
    }

    /// Make every write to `line` fail
    pub fn fail_writes_on(&self, line: Option<Line>) {
        self.state.borrow_mut().fail_line = line;
    }
}

/// GPIO side of the bench
pub struct DummyGpio {
    state: Rc<RefCell<BenchState>>,
}

impl DecoderGpio for DummyGpio {
    fn set_output(&mut self, line: Line) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.outputs.contains(&line) {
            state.outputs.push(line);
        }
        Ok(())
    }

    fn write(&mut self, line: Line, level: Level) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_line == Some(line) || !state.outputs.contains(&line) {
            return Err(Error::Gpio { line });
        }
        match state.levels.iter_mut().find(|(l, _)| *l == line) {
            Some((_, current)) => *current = level,
            None => state.levels.push((line, level)),
        }
        Ok(())
    }
}

/// SPI side of the bench
///
/// Native CS0 is asserted only inside [`transfer`](SpiTransfer::transfer),
/// so that is when the decoder routes the bytes to an output.
pub struct DummySpi {
    state: Rc<RefCell<BenchState>>,
}

impl SpiTransfer for DummySpi {
    fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<()> {
        check_lengths(write, read)?;
        let mut state = self.state.borrow_mut();
        let device = state.decoded();
        log::trace!("dummy: {} <- {:02X?}", device, write);

        if device == state.config.radio {
            state.radio.clock(write, read);
        } else if state.config.loopback == Some(device) {
            read.copy_from_slice(write);
        } else {
            // Nothing drives MISO
            read.fill(0xFF);
        }

        state.transfers.push(BusTransfer {
            device,
            write: write.to_vec(),
        });
        Ok(())
    }

    fn delay_ms(&mut self, _ms: u32) {
        // No delay needed for the emulator
    }
}

/// Option keys understood by [`parse_options`]
pub const OPTION_KEYS: &[&str] = &["radio", "loopback"];

/// Parse programmer options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<DummyConfig, String> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        match *key {
            "radio" => {
                config.radio = value
                    .parse()
                    .map_err(|e| format!("Invalid radio value: {}", e))?;
            }
            "loopback" => {
                config.loopback = Some(
                    value
                        .parse()
                        .map_err(|e| format!("Invalid loopback value: {}", e))?,
                );
            }
            _ => {
                log::warn!("dummy: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.loopback == Some(config.radio) {
        return Err(format!(
            "Radio and loopback cannot share {}",
            config.radio
        ));
    }

    Ok(config)
}

/// Build a bench and return its boxed GPIO and SPI sides
pub fn open_dummy(
    options: &[(&str, &str)],
    pins: DecoderSelectPins,
) -> std::result::Result<(Box<dyn DecoderGpio>, Box<dyn SpiTransfer>), Box<dyn std::error::Error>>
{
    let mut config = parse_options(options)?;
    config.pins = pins;
    log::info!(
        "dummy: Radio on {}{}",
        config.radio,
        config
            .loopback
            .map(|d| format!(", loopback on {}", d))
            .unwrap_or_default()
    );
    let bench = DummyBench::new(config);
    Ok((Box::new(bench.gpio()), Box::new(bench.spi())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use habspi_core::mux::{ChipSelect, ChipSelectMux, SelectGuard};
    use habspi_core::radio::{Radio, SETTLE_DELAY_MS};

    type BenchRadio = Radio<ChipSelectMux<DummyGpio>, DummySpi>;

    fn radio_on(bench: &DummyBench, device: VirtualDeviceId) -> BenchRadio {
        let mux =
            ChipSelectMux::with_config(bench.gpio(), DecoderSelectPins::default(), device).unwrap();
        Radio::new(mux, bench.spi())
    }

    #[test]
    fn test_identity_queries() {
        let bench = DummyBench::new_default();
        let mut radio = radio_on(&bench, VirtualDeviceId::B);
        assert_eq!(radio.device_name().unwrap().as_str(), "SRB-MX146LV");
        assert_eq!(radio.serial_number().unwrap().as_str(), "0001234");
        assert_eq!(radio.firmware_version().unwrap().as_str(), "1.2");
        assert_eq!(radio.date_code().unwrap().as_str(), "1324");
    }

    #[test]
    fn test_temperature_raw() {
        let bench = DummyBench::new_default();
        let mut radio = radio_on(&bench, VirtualDeviceId::B);
        let raw = radio.temperature_raw().unwrap();
        assert_eq!(&raw[..3], &[0, 1, 23]);
    }

    #[test]
    fn test_every_frame_sent_twice_to_the_radio() {
        let bench = DummyBench::new_default();
        let mut radio = radio_on(&bench, VirtualDeviceId::B);
        radio.frequency_bounds().unwrap();

        let transfers = bench.transfers();
        assert_eq!(transfers.len(), 2);
        assert!(transfers.iter().all(|t| t.device == VirtualDeviceId::B));
        assert_eq!(transfers[0], transfers[1]);
        assert_eq!(SETTLE_DELAY_MS, 20);
    }

    #[test]
    fn test_lines_released_after_each_operation() {
        let bench = DummyBench::new_default();
        let mut radio = radio_on(&bench, VirtualDeviceId::D);
        let _ = radio.device_name();
        let pins = DecoderSelectPins::default();
        assert_eq!(bench.level(pins.a), Level::Low);
        assert_eq!(bench.level(pins.b), Level::Low);
        assert_eq!(bench.decoded_device(), VirtualDeviceId::A);
        assert_eq!(bench.transfers()[0].device, VirtualDeviceId::D);
    }

    #[test]
    fn test_wrong_output_reads_idle_bus() {
        let bench = DummyBench::new_default();
        let mut radio = radio_on(&bench, VirtualDeviceId::C);
        assert_eq!(
            radio.device_name(),
            Err(Error::MalformedResponse {
                claimed: 0xFF,
                capacity: 20
            })
        );
    }

    #[test]
    fn test_frequency_memory_round_trip() {
        let bench = DummyBench::new_default();
        let mut radio = radio_on(&bench, VirtualDeviceId::B);

        radio.set_aprs_frequency().unwrap();
        radio.store_channel(4).unwrap();
        radio.set_frequency(146_520_000).unwrap();
        assert_eq!(bench.radio().frequency(), 146_520_000);

        radio.recall_channel(4).unwrap();
        assert_eq!(bench.radio().frequency(), 144_390_000);
        assert_eq!(radio.recall_channel(16), Err(Error::ChannelOutOfRange(16)));
        assert_eq!(bench.transfers().len(), 8);
    }

    #[test]
    fn test_loopback_device() {
        let bench = DummyBench::new(DummyConfig {
            loopback: Some(VirtualDeviceId::A),
            ..Default::default()
        });
        let mut radio = radio_on(&bench, VirtualDeviceId::A);
        let mut read = [0u8; 4];
        radio.exchange(b"****", &mut read).unwrap();
        assert_eq!(&read, b"****");
    }

    #[test]
    fn test_gpio_failure_still_releases() {
        let bench = DummyBench::new_default();
        let pins = DecoderSelectPins::default();
        let mut mux =
            ChipSelectMux::with_config(bench.gpio(), pins, VirtualDeviceId::D).unwrap();
        bench.fail_writes_on(Some(pins.b));

        assert_eq!(
            SelectGuard::assert(&mut mux).err(),
            Some(Error::Gpio { line: pins.b })
        );
        // A went high for the select, then back low on release
        assert_eq!(bench.level(pins.a), Level::Low);
    }

    #[test]
    fn test_release_drives_b_when_a_fails() {
        let bench = DummyBench::new_default();
        let pins = DecoderSelectPins::default();
        let mut mux =
            ChipSelectMux::with_config(bench.gpio(), pins, VirtualDeviceId::D).unwrap();
        mux.select().unwrap();
        assert_eq!(bench.decoded_device(), VirtualDeviceId::D);

        bench.fail_writes_on(Some(pins.a));
        assert_eq!(mux.deselect(), Err(Error::Gpio { line: pins.a }));
        assert_eq!(bench.level(pins.b), Level::Low);
        assert_eq!(bench.decoded_device(), VirtualDeviceId::B);
    }

    #[test]
    fn test_unconfigured_mux_uses_default_lines() {
        let bench = DummyBench::new_default();
        let mut mux = ChipSelectMux::new(bench.gpio());
        mux.set_active_device(VirtualDeviceId::C);
        mux.select().unwrap();
        assert_eq!(bench.decoded_device(), VirtualDeviceId::C);
        mux.deselect().unwrap();
        assert_eq!(bench.decoded_device(), VirtualDeviceId::A);

        let mut radio = Radio::new(ChipSelectMux::new(bench.gpio()), bench.spi());
        radio.chip_select_mut().set_active_device(VirtualDeviceId::B);
        assert_eq!(radio.device_name().unwrap().as_str(), "SRB-MX146LV");
    }

    #[test]
    fn test_unconfigured_lines_rejected() {
        let bench = DummyBench::new_default();
        let mut gpio = bench.gpio();
        assert_eq!(gpio.write(24, Level::High), Err(Error::Gpio { line: 24 }));
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("radio", "d"), ("loopback", "CSA")]).unwrap();
        assert_eq!(config.radio, VirtualDeviceId::D);
        assert_eq!(config.loopback, Some(VirtualDeviceId::A));
        assert!(parse_options(&[("radio", "E")]).is_err());
        assert!(parse_options(&[("radio", "B"), ("loopback", "B")]).is_err());
    }
}

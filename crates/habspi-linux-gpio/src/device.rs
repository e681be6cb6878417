//! Linux GPIO decoder select lines
//!
//! Each select line is requested from the GPIO character device the first
//! time it is configured as an output and held until the driver is dropped.

use crate::error::{LinuxGpioError, Result};

use gpiocdev::line::{Offset, Value};
use gpiocdev::request::{Config, Request};

use habspi_core::error::{Error as CoreError, Result as CoreResult};
use habspi_core::gpio::{DecoderGpio, Level, Line};

/// Default GPIO chip (the header GPIOs on a Raspberry Pi)
pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

/// Consumer label shown by `gpioinfo`
const CONSUMER: &str = "habspi";

/// Configuration for the Linux GPIO backend
#[derive(Debug, Clone)]
pub struct LinuxGpioConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
}

impl Default for LinuxGpioConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_CHIP.to_string(),
        }
    }
}

impl LinuxGpioConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }
}

/// Output lines requested through gpiocdev
pub struct LinuxGpio {
    device: String,
    /// One request per configured line
    lines: Vec<(Offset, Request)>,
}

impl LinuxGpio {
    /// Prepare a driver for the given chip; no line is requested yet
    pub fn open(config: &LinuxGpioConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxGpioError::InvalidParameter(
                "No GPIO chip specified. Use gpiochip=N or gpiochip=/dev/gpiochipN".into(),
            ));
        }
        log::debug!("linux_gpio: Using {}", config.device);
        Ok(Self {
            device: config.device.clone(),
            lines: Vec::new(),
        })
    }

    /// Chip path
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Offsets currently held as outputs
    pub fn requested_lines(&self) -> impl Iterator<Item = Offset> + '_ {
        self.lines.iter().map(|(offset, _)| *offset)
    }

    fn request(&self, line: Offset) -> Option<&Request> {
        self.lines
            .iter()
            .find(|(offset, _)| *offset == line)
            .map(|(_, req)| req)
    }

    /// Request `line` as an output driven low, or reconfigure it if held
    pub fn configure_output(&mut self, line: Offset) -> Result<()> {
        let mut cfg = Config::default();
        cfg.with_line(line).as_output(Value::Inactive);

        if let Some(req) = self.request(line) {
            req.reconfigure(&cfg)
                .map_err(|source| LinuxGpioError::ReconfigureFailed { line, source })?;
            log::debug!("linux_gpio: Reconfigured line {} as output", line);
            return Ok(());
        }

        let req = Request::from_config(cfg)
            .on_chip(&self.device)
            .with_consumer(CONSUMER)
            .request()
            .map_err(|source| LinuxGpioError::LineRequestFailed {
                path: self.device.clone(),
                line,
                source,
            })?;

        log::info!("linux_gpio: Requested line {} on {}", line, self.device);
        self.lines.push((line, req));
        Ok(())
    }

    /// Drive a previously configured line
    pub fn set_level(&self, line: Offset, level: Level) -> Result<()> {
        let req = self.request(line).ok_or(LinuxGpioError::NotOutput(line))?;
        let value = if level.is_high() {
            Value::Active
        } else {
            Value::Inactive
        };
        req.set_value(line, value)
            .map_err(|source| LinuxGpioError::SetValueFailed { line, source })
    }
}

fn to_core(e: LinuxGpioError, line: Line) -> CoreError {
    log::error!("linux_gpio: {}", e);
    CoreError::Gpio {
        line: e.line().unwrap_or(line),
    }
}

impl DecoderGpio for LinuxGpio {
    fn set_output(&mut self, line: Line) -> CoreResult<()> {
        self.configure_output(line).map_err(|e| to_core(e, line))
    }

    fn write(&mut self, line: Line, level: Level) -> CoreResult<()> {
        self.set_level(line, level).map_err(|e| to_core(e, line))
    }
}

/// Option keys understood by [`parse_options`]
pub const OPTION_KEYS: &[&str] = &["gpiochip"];

/// Parse programmer options from a list of key-value pairs
///
/// `gpiochip` accepts a chip number (`gpiochip=0`) or a device path.
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxGpioConfig, String> {
    let mut config = LinuxGpioConfig::default();

    for (key, value) in options {
        match *key {
            "gpiochip" => {
                config.device = match value.parse::<u32>() {
                    Ok(n) => format!("/dev/gpiochip{}", n),
                    Err(_) if value.starts_with('/') => value.to_string(),
                    Err(_) => return Err(format!("Invalid gpiochip value: {}", value)),
                };
            }
            _ => {
                log::warn!("linux_gpio: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_default_chip() {
        let config = parse_options(&[]).unwrap();
        assert_eq!(config.device, DEFAULT_CHIP);
    }

    #[test]
    fn test_parse_options_chip_number() {
        let config = parse_options(&[("gpiochip", "4")]).unwrap();
        assert_eq!(config.device, "/dev/gpiochip4");
    }

    #[test]
    fn test_parse_options_chip_path() {
        let config = parse_options(&[("gpiochip", "/dev/gpiochip1")]).unwrap();
        assert_eq!(config.device, "/dev/gpiochip1");
        assert!(parse_options(&[("gpiochip", "chip")]).is_err());
    }

    #[test]
    fn test_write_before_configure_fails() {
        let mut gpio = LinuxGpio::open(&LinuxGpioConfig::default()).unwrap();
        assert_eq!(
            gpio.write(24, Level::High),
            Err(CoreError::Gpio { line: 24 })
        );
        assert_eq!(gpio.requested_lines().count(), 0);
    }

    #[test]
    fn test_open_rejects_empty_device() {
        assert!(LinuxGpio::open(&LinuxGpioConfig::new("")).is_err());
    }
}

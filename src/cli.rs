//! CLI argument parsing

use crate::programmers;
use clap::{Parser, Subcommand};
use habspi_core::gpio::Line;
use habspi_core::mux::{VirtualDeviceId, DEFAULT_PIN_A, DEFAULT_PIN_B};

/// Parse a virtual chip select (`B`, `csb`, `CSB`)
fn parse_device(s: &str) -> Result<VirtualDeviceId, String> {
    s.parse().map_err(|e| format!("{}", e))
}

/// Parse a frequency in Hz, kHz or MHz (`144390000`, `144390k`, `144.39M`)
pub fn parse_frequency(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let lower = s.to_ascii_lowercase();
    let (number, scale) = if let Some(n) = lower.strip_suffix("mhz").or(lower.strip_suffix('m')) {
        (n, 1_000_000.0)
    } else if let Some(n) = lower.strip_suffix("khz").or(lower.strip_suffix('k')) {
        (n, 1_000.0)
    } else {
        let n = lower.strip_suffix("hz").unwrap_or(&lower);
        return n
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("Invalid frequency '{}': {}", s, e));
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|e| format!("Invalid frequency '{}': {}", s, e))?;
    let hz = (value * scale).round();
    if !(0.0..=u32::MAX as f64).contains(&hz) {
        return Err(format!("Frequency '{}' out of range", s));
    }
    Ok(hz as u32)
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use, name[:key=value,...] [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "habspi")]
#[command(
    author,
    version,
    about = "SRB-MX146LV radio control through a 74HC139 chip-select multiplexer",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Programmer to use
    #[arg(short, long, global = true, default_value = "linux", help = programmer_help())]
    pub programmer: String,

    /// Virtual chip select the radio sits on (A-D)
    #[arg(long, global = true, default_value = "B", value_parser = parse_device)]
    pub cs: VirtualDeviceId,

    /// GPIO line driving decoder input A
    #[arg(long, global = true, default_value_t = DEFAULT_PIN_A)]
    pub pin_a: Line,

    /// GPIO line driving decoder input B
    #[arg(long, global = true, default_value_t = DEFAULT_PIN_B)]
    pub pin_b: Line,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the device name (QN)
    Name,

    /// Read the serial number (Q#)
    Serial,

    /// Read the firmware version (QV)
    Version,

    /// Read the date code (QD)
    Date,

    /// Read the temperature frame (QT), printed as hex
    Temp,

    /// Read the tuning range (QF)
    FreqRange,

    /// Set the active frequency
    SetFreq {
        /// Frequency, e.g. 144390000, 144390k or 144.39M
        #[arg(value_parser = parse_frequency)]
        frequency: u32,

        /// Refuse frequencies outside the range the radio reports
        #[arg(long)]
        check: bool,
    },

    /// Tune to the US APRS frequency (144.390 MHz)
    Aprs,

    /// Load a memory channel into the active frequency
    Recall {
        /// Memory channel (0-15)
        channel: u8,
    },

    /// Store the active frequency into a memory channel
    Store {
        /// Memory channel (0-15)
        channel: u8,
    },

    /// Send four '*' bytes on the selected chip select and print the reply
    CsTest,

    /// List supported programmers
    ListProgrammers,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_frequency() {
        assert_eq!(parse_frequency("144390000"), Ok(144_390_000));
        assert_eq!(parse_frequency("144.39M"), Ok(144_390_000));
        assert_eq!(parse_frequency("144.39MHz"), Ok(144_390_000));
        assert_eq!(parse_frequency("146520k"), Ok(146_520_000));
        assert_eq!(parse_frequency("1000Hz"), Ok(1000));
        assert!(parse_frequency("fast").is_err());
        assert!(parse_frequency("5000M").is_err());
        assert!(parse_frequency("-1").is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["habspi", "name"]).unwrap();
        assert_eq!(cli.cs, VirtualDeviceId::B);
        assert_eq!((cli.pin_a, cli.pin_b), (24, 25));
        assert_eq!(cli.programmer, "linux");
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli =
            Cli::try_parse_from(["habspi", "recall", "3", "-p", "dummy", "--cs", "csd"]).unwrap();
        assert_eq!(cli.cs, VirtualDeviceId::D);
        assert_eq!(cli.programmer, "dummy");
        assert!(matches!(cli.command, Commands::Recall { channel: 3 }));
    }

    #[test]
    fn test_rejects_bad_chip_select() {
        assert!(Cli::try_parse_from(["habspi", "--cs", "E", "name"]).is_err());
    }
}

//! habspi - SRB-MX146LV radio control for the HAB main board
//!
//! The board multiplexes one native SPI chip select into four with a
//! 74HC139 decoder. habspi drives the decoder select lines, brackets every
//! radio exchange with them and speaks the radio's framed SPI protocol.
//!
//! # Architecture
//!
//! - `habspi-core` holds the multiplexer, the select guard, the framing and
//!   the [`Radio`](habspi_core::radio::Radio) driver, generic over two seams
//! - backend crates implement those seams (Linux spidev, Linux GPIO
//!   character device, an in-memory emulator)
//! - this binary picks the backends from `--programmer` and runs one command

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use habspi_core::mux::DecoderSelectPins;
use habspi_core::radio::{MemoryOp, Query};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if let Commands::ListProgrammers = cli.command {
        commands::list_programmers();
        return Ok(());
    }

    let pins = DecoderSelectPins::new(cli.pin_a, cli.pin_b);
    let mut radio = programmers::open_radio(&cli.programmer, pins, cli.cs)?;

    let result = match cli.command {
        Commands::Name => commands::run_text_query(&mut radio, Query::Name),
        Commands::Serial => commands::run_text_query(&mut radio, Query::Serial),
        Commands::Version => commands::run_text_query(&mut radio, Query::Version),
        Commands::Date => commands::run_text_query(&mut radio, Query::DateCode),
        Commands::Temp => commands::run_temperature(&mut radio),
        Commands::FreqRange => commands::run_frequency_range(&mut radio),
        Commands::SetFreq { frequency, check } => {
            commands::run_set_frequency(&mut radio, frequency, check)
        }
        Commands::Aprs => commands::run_aprs(&mut radio),
        Commands::Recall { channel } => {
            commands::run_memory(&mut radio, MemoryOp::Recall, channel)
        }
        Commands::Store { channel } => commands::run_memory(&mut radio, MemoryOp::Store, channel),
        Commands::CsTest => commands::run_cs_test(&mut radio).map(|_| ()),
        Commands::ListProgrammers => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

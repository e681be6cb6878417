//! Radio protocol driver
//!
//! Every operation runs the same fixed sequence:
//!
//! ```text
//! frame -> select -> transfer -> settle -> transfer -> deselect -> parse
//! ```
//!
//! The radio only answers reliably when each frame is clocked out twice.
//! The second response is the one that counts.

use super::frame::{
    memory_frame, query_frame, set_frequency_frame, FrequencyBounds, MemoryOp, QueryResponse,
    QueryText, FRAME_LEN,
};
use super::opcodes;
use crate::error::Result;
use crate::mux::{ChipSelect, SelectGuard};
use crate::spi::{check_lengths, SpiTransfer};

/// Whether every frame is sent twice
///
/// Observed on SRB-MX146LV modules: a single transfer leaves the radio
/// unresponsive or returns a stale frame. The cause is not documented.
pub const REQUIRES_DOUBLE_TRANSFER: bool = true;

/// Delay between the two transfers of a frame, in milliseconds
///
/// Empirical and not validated against the radio's documentation; it may
/// be longer than the radio actually needs.
pub const SETTLE_DELAY_MS: u32 = 20;

/// Named radio queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    /// Device name (`QN`)
    Name,
    /// Serial number (`Q#`)
    Serial,
    /// Firmware version (`QV`)
    Version,
    /// Date code (`QD`)
    DateCode,
    /// Temperature (`QT`)
    Temperature,
    /// Frequency range (`QF`)
    FrequencyRange,
}

impl Query {
    /// Two-byte opcode
    pub const fn opcode(self) -> [u8; 2] {
        match self {
            Self::Name => opcodes::QN,
            Self::Serial => opcodes::QSERIAL,
            Self::Version => opcodes::QV,
            Self::DateCode => opcodes::QD,
            Self::Temperature => opcodes::QT,
            Self::FrequencyRange => opcodes::QF,
        }
    }

    /// Human readable name
    pub const fn description(self) -> &'static str {
        match self {
            Self::Name => "device name",
            Self::Serial => "serial number",
            Self::Version => "firmware version",
            Self::DateCode => "date code",
            Self::Temperature => "temperature",
            Self::FrequencyRange => "frequency range",
        }
    }
}

/// SRB-MX146LV radio behind a virtual chip select
///
/// The driver owns both the chip select and the SPI bus, and every
/// operation borrows it mutably, so a handle can only ever have one
/// transaction in flight.
pub struct Radio<C, S> {
    cs: C,
    spi: S,
}

impl<C, S> Radio<C, S> {
    /// Create a driver from a chip select and a bus
    pub fn new(cs: C, spi: S) -> Self {
        Self { cs, spi }
    }

    /// Borrow the chip select
    pub fn chip_select(&self) -> &C {
        &self.cs
    }

    /// Mutably borrow the chip select (e.g. to retarget the multiplexer)
    pub fn chip_select_mut(&mut self) -> &mut C {
        &mut self.cs
    }

    /// Borrow the SPI bus
    pub fn bus(&self) -> &S {
        &self.spi
    }

    /// Release the chip select and the bus
    pub fn release(self) -> (C, S) {
        (self.cs, self.spi)
    }
}

impl<C, S> Radio<C, S>
where
    C: ChipSelect,
    S: SpiTransfer,
{
    /// Run one bracketed exchange of a caller-built frame
    ///
    /// The chip select is released whether or not the transfers succeed.
    /// `read` receives the response of the last transfer.
    pub fn exchange(&mut self, write: &[u8], read: &mut [u8]) -> Result<()> {
        check_lengths(write, read)?;
        log::debug!("radio: -> {:02X?}", write);

        let guard = SelectGuard::assert(&mut self.cs)?;
        let transferred = transfer_frame(&mut self.spi, write, read);
        match transferred {
            Ok(()) => guard.finish()?,
            Err(e) => {
                drop(guard);
                log::debug!("radio: Transfer failed: {}", e);
                return Err(e);
            }
        }

        log::debug!("radio: <- {:02X?}", read);
        Ok(())
    }

    /// Send a padded query and return the raw response frame
    pub fn query(&mut self, query: Query) -> Result<[u8; FRAME_LEN]> {
        let frame = query_frame(&query.opcode())?;
        let mut response = [0u8; FRAME_LEN];
        self.exchange(&frame, &mut response)?;
        Ok(response)
    }

    /// Send a text query (name, serial, version, date code)
    pub fn query_text(&mut self, query: Query) -> Result<QueryText> {
        let response = self.query(query)?;
        let text = QueryResponse::parse(&response)?.text();
        if text.error_code != 0 {
            log::warn!(
                "radio: {} query returned error code 0x{:02X}",
                query.description(),
                text.error_code
            );
        }
        Ok(text)
    }

    /// Read the device name
    pub fn device_name(&mut self) -> Result<QueryText> {
        self.query_text(Query::Name)
    }

    /// Read the serial number
    pub fn serial_number(&mut self) -> Result<QueryText> {
        self.query_text(Query::Serial)
    }

    /// Read the firmware version
    pub fn firmware_version(&mut self) -> Result<QueryText> {
        self.query_text(Query::Version)
    }

    /// Read the date code
    pub fn date_code(&mut self) -> Result<QueryText> {
        self.query_text(Query::DateCode)
    }

    /// Read the temperature response as a raw frame
    pub fn temperature_raw(&mut self) -> Result<[u8; FRAME_LEN]> {
        self.query(Query::Temperature)
    }

    /// Read the tuning range
    pub fn frequency_bounds(&mut self) -> Result<FrequencyBounds> {
        let response = self.query(Query::FrequencyRange)?;
        FrequencyBounds::parse(&response)
    }

    /// Set the active frequency in Hz
    ///
    /// The value is not checked against [`frequency_bounds`](Self::frequency_bounds).
    pub fn set_frequency(&mut self, hz: u32) -> Result<()> {
        let frame = set_frequency_frame(hz);
        let mut ack = [0u8; 5];
        log::info!("radio: Setting frequency to {} Hz", hz);
        self.exchange(&frame, &mut ack)
    }

    /// Tune to the US APRS frequency (144.390 MHz)
    pub fn set_aprs_frequency(&mut self) -> Result<()> {
        self.set_frequency(opcodes::APRS_US_HZ)
    }

    /// Run a memory recall or store on `channel` (0-15)
    ///
    /// Out of range channels are rejected before the chip select is touched.
    pub fn memory(&mut self, op: MemoryOp, channel: u8) -> Result<()> {
        let frame = memory_frame(op, channel)?;
        let mut ack = [0u8; 2];
        log::info!("radio: Memory {:?} channel {}", op, channel);
        self.exchange(&frame, &mut ack)
    }

    /// Load memory `channel` into the active frequency
    pub fn recall_channel(&mut self, channel: u8) -> Result<()> {
        self.memory(MemoryOp::Recall, channel)
    }

    /// Store the active frequency into memory `channel`
    pub fn store_channel(&mut self, channel: u8) -> Result<()> {
        self.memory(MemoryOp::Store, channel)
    }
}

fn transfer_frame<S: SpiTransfer>(spi: &mut S, write: &[u8], read: &mut [u8]) -> Result<()> {
    spi.transfer(write, read)?;
    if REQUIRES_DOUBLE_TRANSFER {
        spi.delay_ms(SETTLE_DELAY_MS);
        spi.transfer(write, read)?;
    }
    Ok(())
}

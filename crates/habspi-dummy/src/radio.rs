//! Emulated SRB-MX146LV
//!
//! The emulated radio answers each frame on the *next* transfer: the bytes
//! clocked out during a transfer are the response to the previous frame.
//! Sending every frame twice therefore returns the real answer on the
//! second transfer.

use habspi_core::radio::opcodes;
use habspi_core::radio::{FRAME_LEN, MAX_CHANNEL, PAYLOAD_CAPACITY};

/// Number of memory channels
pub const CHANNELS: usize = MAX_CHANNEL as usize + 1;

/// Error code returned for frames the radio does not understand
pub const ERR_UNKNOWN_COMMAND: u8 = 0x01;

/// Identity and tuning parameters of the emulated radio
#[derive(Debug, Clone)]
pub struct RadioConfig {
    /// Answer to `QN`
    pub name: String,
    /// Answer to `Q#`
    pub serial: String,
    /// Answer to `QV`
    pub version: String,
    /// Answer to `QD`
    pub date_code: String,
    /// Answer to `QT`, degrees Celsius
    pub temperature: i8,
    /// Lowest tunable frequency in Hz
    pub min_hz: u32,
    /// Highest tunable frequency in Hz
    pub max_hz: u32,
    /// Tuning step in Hz
    pub step_hz: u32,
    /// Active frequency at power up
    pub frequency: u32,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            name: "SRB-MX146LV".into(),
            serial: "0001234".into(),
            version: "1.2".into(),
            date_code: "1324".into(),
            temperature: 23,
            min_hz: 136_000_000,
            max_hz: 174_000_000,
            step_hz: 1_250,
            frequency: 146_000_000,
        }
    }
}

/// Radio state machine
#[derive(Debug, Clone)]
pub struct DummyRadio {
    config: RadioConfig,
    frequency: u32,
    memory: [u32; CHANNELS],
    /// Response to the last frame, clocked out on the next transfer
    pending: Vec<u8>,
}

impl DummyRadio {
    /// Power up a radio
    pub fn new(config: RadioConfig) -> Self {
        let frequency = config.frequency;
        Self {
            config,
            frequency,
            memory: [frequency; CHANNELS],
            pending: Vec::new(),
        }
    }

    /// Active frequency in Hz
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Frequency stored in `channel`
    pub fn channel(&self, channel: u8) -> Option<u32> {
        self.memory.get(channel as usize).copied()
    }

    /// Identity and tuning parameters
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Clock one frame through the radio
    ///
    /// `read` receives the pending response (idle bus bytes past its end),
    /// then `write` is decoded and its answer becomes the new pending one.
    pub fn clock(&mut self, write: &[u8], read: &mut [u8]) {
        for (i, b) in read.iter_mut().enumerate() {
            *b = self.pending.get(i).copied().unwrap_or(0xFF);
        }
        self.pending = self.handle(write);
    }

    fn handle(&mut self, frame: &[u8]) -> Vec<u8> {
        match frame {
            [q, code, ..] if *q == opcodes::QN[0] => self.query(*code),
            [op, a, b, c, d, ..] if *op == opcodes::SET_FREQ => {
                let hz = u32::from_le_bytes([*a, *b, *c, *d]);
                if !(self.config.min_hz..=self.config.max_hz).contains(&hz) {
                    log::warn!("dummy: Frequency {} Hz outside tuning range", hz);
                }
                self.frequency = hz;
                log::debug!("dummy: Active frequency {} Hz", hz);
                vec![0; frame.len()]
            }
            [op, channel, ..] if *op == opcodes::MEM_RECALL => {
                if let Some(&hz) = self.memory.get(*channel as usize) {
                    self.frequency = hz;
                    log::debug!("dummy: Recalled channel {} ({} Hz)", channel, hz);
                }
                vec![0; frame.len()]
            }
            [op, channel, ..] if *op == opcodes::MEM_STORE => {
                if let Some(slot) = self.memory.get_mut(*channel as usize) {
                    *slot = self.frequency;
                    log::debug!("dummy: Stored {} Hz in channel {}", self.frequency, channel);
                }
                vec![0; frame.len()]
            }
            _ => {
                log::debug!("dummy: Ignoring frame {:02X?}", frame);
                Vec::new()
            }
        }
    }

    fn query(&self, code: u8) -> Vec<u8> {
        let opcode = [opcodes::QN[0], code];
        let payload: Vec<u8> = match opcode {
            opcodes::QN => self.config.name.as_bytes().to_vec(),
            opcodes::QSERIAL => self.config.serial.as_bytes().to_vec(),
            opcodes::QV => self.config.version.as_bytes().to_vec(),
            opcodes::QD => self.config.date_code.as_bytes().to_vec(),
            opcodes::QT => vec![self.config.temperature as u8],
            opcodes::QF => [self.config.min_hz, self.config.max_hz, self.config.step_hz]
                .iter()
                .flat_map(|v| v.to_le_bytes())
                .collect(),
            _ => return response(ERR_UNKNOWN_COMMAND, &[]),
        };
        response(0, &payload)
    }
}

/// `[error_code, len, payload...]` padded to a full frame
fn response(error_code: u8, payload: &[u8]) -> Vec<u8> {
    let len = payload.len().min(PAYLOAD_CAPACITY);
    let mut frame = vec![0u8; FRAME_LEN];
    frame[0] = error_code;
    frame[1] = len as u8;
    frame[2..2 + len].copy_from_slice(&payload[..len]);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use habspi_core::radio::{query_frame, set_frequency_frame, FrequencyBounds, QueryResponse};

    fn clock_twice(radio: &mut DummyRadio, frame: &[u8]) -> Vec<u8> {
        let mut read = vec![0u8; frame.len()];
        radio.clock(frame, &mut read);
        radio.clock(frame, &mut read);
        read
    }

    #[test]
    fn test_answer_lags_one_frame() {
        let mut radio = DummyRadio::new(RadioConfig::default());
        let frame = query_frame(b"QN").unwrap();
        let mut read = [0u8; FRAME_LEN];

        radio.clock(&frame, &mut read);
        assert_eq!(read, [0xFF; FRAME_LEN]);

        radio.clock(&frame, &mut read);
        let text = QueryResponse::parse(&read).unwrap().text();
        assert_eq!(text.as_str(), "SRB-MX146LV");
    }

    #[test]
    fn test_frequency_range() {
        let mut radio = DummyRadio::new(RadioConfig::default());
        let read = clock_twice(&mut radio, &query_frame(b"QF").unwrap());
        let bounds = FrequencyBounds::parse(&read).unwrap();
        assert_eq!(bounds.min_hz, 136_000_000);
        assert_eq!(bounds.max_hz, 174_000_000);
        assert_eq!(bounds.step_hz, 1_250);
    }

    #[test]
    fn test_unknown_query_sets_error_code() {
        let mut radio = DummyRadio::new(RadioConfig::default());
        let read = clock_twice(&mut radio, &query_frame(b"QZ").unwrap());
        let resp = QueryResponse::parse(&read).unwrap();
        assert_eq!(resp.error_code, ERR_UNKNOWN_COMMAND);
        assert!(resp.payload.is_empty());
    }

    #[test]
    fn test_store_and_recall() {
        let mut radio = DummyRadio::new(RadioConfig::default());
        clock_twice(&mut radio, &set_frequency_frame(145_000_000));
        clock_twice(&mut radio, &[opcodes::MEM_STORE, 7]);
        clock_twice(&mut radio, &set_frequency_frame(144_390_000));
        assert_eq!(radio.frequency(), 144_390_000);

        clock_twice(&mut radio, &[opcodes::MEM_RECALL, 7]);
        assert_eq!(radio.frequency(), 145_000_000);
        assert_eq!(radio.channel(7), Some(145_000_000));
        assert_eq!(radio.channel(16), None);
    }
}

//! Command frames and response parsing

use super::opcodes;
use crate::error::{Error, Result};
use core::fmt;
use heapless::String;

/// Length of every query frame (and its response)
pub const FRAME_LEN: usize = 22;

/// Room for the payload of a query response (`[err, len, payload...]`)
pub const PAYLOAD_CAPACITY: usize = FRAME_LEN - 2;

/// Length of a set-frequency frame
pub const SET_FREQ_LEN: usize = 5;

/// Length of a memory recall/store frame
pub const MEMORY_LEN: usize = 2;

/// Highest memory channel
pub const MAX_CHANNEL: u8 = 15;

/// Build a query frame: pad the whole frame first, then copy the payload
///
/// A payload longer than [`FRAME_LEN`] is rejected.
pub fn query_frame(payload: &[u8]) -> Result<[u8; FRAME_LEN]> {
    if payload.len() > FRAME_LEN {
        return Err(Error::FrameTooLong(payload.len()));
    }
    let mut frame = [opcodes::PAD; FRAME_LEN];
    frame[..payload.len()].copy_from_slice(payload);
    Ok(frame)
}

/// Build the exact-length set-frequency frame (`'B'` + u32 LE)
pub fn set_frequency_frame(hz: u32) -> [u8; SET_FREQ_LEN] {
    let mut frame = [0u8; SET_FREQ_LEN];
    frame[0] = opcodes::SET_FREQ;
    frame[1..].copy_from_slice(&hz.to_le_bytes());
    frame
}

/// Memory channel operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOp {
    /// Load the channel into the active frequency (`'M'`)
    Recall,
    /// Write the active frequency into the channel (`'m'`)
    Store,
}

impl MemoryOp {
    /// Opcode byte
    pub const fn opcode(self) -> u8 {
        match self {
            Self::Recall => opcodes::MEM_RECALL,
            Self::Store => opcodes::MEM_STORE,
        }
    }
}

/// Build the exact-length memory frame (opcode + channel)
///
/// Channels above [`MAX_CHANNEL`] are rejected.
pub fn memory_frame(op: MemoryOp, channel: u8) -> Result<[u8; MEMORY_LEN]> {
    if channel > MAX_CHANNEL {
        return Err(Error::ChannelOutOfRange(channel));
    }
    Ok([op.opcode(), channel])
}

/// Parsed `[error_code, payload_length, payload...]` response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryResponse<'a> {
    /// Status byte reported by the radio (0 on success)
    pub error_code: u8,
    /// Payload bytes
    pub payload: &'a [u8],
}

impl<'a> QueryResponse<'a> {
    /// Split a response frame into error code and payload
    pub fn parse(frame: &'a [u8]) -> Result<Self> {
        let capacity = frame.len().saturating_sub(2);
        let (error_code, claimed) = match frame {
            [err, len, ..] => (*err, *len),
            _ => {
                return Err(Error::MalformedResponse {
                    claimed: 0,
                    capacity,
                })
            }
        };

        let len = claimed as usize;
        if len > capacity {
            return Err(Error::MalformedResponse { claimed, capacity });
        }

        Ok(Self {
            error_code,
            payload: &frame[2..2 + len],
        })
    }

    /// Decode the payload as text
    pub fn text(&self) -> QueryText {
        QueryText::decode(self.error_code, self.payload)
    }
}

/// Text answer to a name/serial/version/date query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryText {
    /// Status byte reported by the radio
    pub error_code: u8,
    /// Payload, non-printable bytes shown as `.`
    pub text: String<PAYLOAD_CAPACITY>,
}

impl QueryText {
    fn decode(error_code: u8, payload: &[u8]) -> Self {
        let mut text = String::new();
        for &b in payload.iter().take(PAYLOAD_CAPACITY) {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            };
            // Capacity equals the payload limit and every char is one byte
            let _ = text.push(c);
        }
        Self { error_code, text }
    }

    /// Decoded text
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for QueryText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Tuning range reported by `QF`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyBounds {
    /// Lowest frequency in Hz
    pub min_hz: u32,
    /// Highest frequency in Hz
    pub max_hz: u32,
    /// Tuning step in Hz
    pub step_hz: u32,
}

impl FrequencyBounds {
    const MIN_OFFSET: usize = 2;
    const MAX_OFFSET: usize = 6;
    const STEP_OFFSET: usize = 10;

    /// Read the three little-endian words at offsets 2, 6 and 10
    pub fn parse(frame: &[u8]) -> Result<Self> {
        Ok(Self {
            min_hz: read_le_u32(frame, Self::MIN_OFFSET)?,
            max_hz: read_le_u32(frame, Self::MAX_OFFSET)?,
            step_hz: read_le_u32(frame, Self::STEP_OFFSET)?,
        })
    }

    /// Whether `hz` lies in `min_hz..=max_hz`
    pub fn contains(&self, hz: u32) -> bool {
        (self.min_hz..=self.max_hz).contains(&hz)
    }
}

impl fmt::Display for FrequencyBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.min_hz, self.max_hz, self.step_hz)
    }
}

fn read_le_u32(frame: &[u8], offset: usize) -> Result<u32> {
    frame
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(Error::MalformedResponse {
            claimed: 4,
            capacity: frame.len().saturating_sub(offset),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_frame_padding() {
        let frame = query_frame(b"QN").unwrap();
        assert_eq!(frame.len(), FRAME_LEN);
        assert_eq!(&frame[..2], b"QN");
        assert!(frame[2..].iter().all(|&b| b == 0x3F));
    }

    #[test]
    fn test_payload_wins_over_padding() {
        // Payload bytes equal to or around the pad value must survive
        let payload = [0x3F, 0x00, 0xFF, 0x3E, 0x40];
        let frame = query_frame(&payload).unwrap();
        assert_eq!(&frame[..5], &payload);
        assert!(frame[5..].iter().all(|&b| b == opcodes::PAD));
    }

    #[test]
    fn test_query_frame_rejects_long_payload() {
        assert_eq!(query_frame(&[0xAA; 23]), Err(Error::FrameTooLong(23)));
        assert_eq!(query_frame(&[0xAA; FRAME_LEN]), Ok([0xAA; FRAME_LEN]));
    }

    #[test]
    fn test_set_frequency_frame() {
        let frame = set_frequency_frame(144_390_000);
        assert_eq!(frame, [b'B', 0x70, 0x37, 0x9B, 0x08]);
    }

    #[test]
    fn test_memory_frame() {
        assert_eq!(memory_frame(MemoryOp::Recall, 3), Ok([b'M', 3]));
        assert_eq!(memory_frame(MemoryOp::Store, 15), Ok([b'm', 15]));
        assert_eq!(
            memory_frame(MemoryOp::Store, 16),
            Err(Error::ChannelOutOfRange(16))
        );
    }

    #[test]
    fn test_parse_text() {
        let mut frame = [0x3Fu8; FRAME_LEN];
        frame[..5].copy_from_slice(&[0x00, 3, b'A', b'B', b'C']);
        let resp = QueryResponse::parse(&frame).unwrap();
        assert_eq!(resp.error_code, 0);
        assert_eq!(resp.payload, b"ABC");
        assert_eq!(resp.text().as_str(), "ABC");
    }

    #[test]
    fn test_parse_full_payload() {
        let mut frame = [b'x'; FRAME_LEN];
        frame[0] = 0;
        frame[1] = PAYLOAD_CAPACITY as u8;
        let resp = QueryResponse::parse(&frame).unwrap();
        assert_eq!(resp.payload.len(), PAYLOAD_CAPACITY);
    }

    #[test]
    fn test_parse_rejects_oversized_length() {
        let mut frame = [0u8; FRAME_LEN];
        frame[1] = 21;
        assert_eq!(
            QueryResponse::parse(&frame),
            Err(Error::MalformedResponse {
                claimed: 21,
                capacity: 20
            })
        );
        assert!(QueryResponse::parse(&[0x00]).is_err());
    }

    #[test]
    fn test_text_replaces_unprintable() {
        let frame = [0x02, 4, b'O', 0x00, b'K', 0xFF];
        let text = QueryResponse::parse(&frame).unwrap().text();
        assert_eq!(text.error_code, 2);
        assert_eq!(text.as_str(), "O.K.");
    }

    #[test]
    fn test_frequency_bounds() {
        let mut frame = [0u8; FRAME_LEN];
        frame[2..6].copy_from_slice(&100u32.to_le_bytes());
        frame[6..10].copy_from_slice(&200u32.to_le_bytes());
        frame[10..14].copy_from_slice(&5u32.to_le_bytes());
        let bounds = FrequencyBounds::parse(&frame).unwrap();
        assert_eq!(
            (bounds.min_hz, bounds.max_hz, bounds.step_hz),
            (100, 200, 5)
        );
        assert!(bounds.contains(150));
        assert!(!bounds.contains(201));
    }

    #[test]
    fn test_frequency_bounds_short_frame() {
        assert!(FrequencyBounds::parse(&[0u8; 12]).is_err());
    }
}

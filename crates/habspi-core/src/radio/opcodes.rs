//! SRB-MX146LV SPI command opcodes
//!
//! Queries are two ASCII bytes. Set commands are a single ASCII byte
//! followed by binary arguments.

/// Query device name
pub const QN: [u8; 2] = *b"QN";
/// Query serial number
pub const QSERIAL: [u8; 2] = *b"Q#";
/// Query firmware version
pub const QV: [u8; 2] = *b"QV";
/// Query date code
pub const QD: [u8; 2] = *b"QD";
/// Query temperature (signed 8-bit, reported as a raw frame)
pub const QT: [u8; 2] = *b"QT";
/// Query frequency range: Fmin, Fmax, Fstep as little-endian u32
pub const QF: [u8; 2] = *b"QF";

/// Set active frequency, followed by a little-endian u32 in Hz
pub const SET_FREQ: u8 = b'B';
/// Load a memory channel into the active frequency, followed by the channel
pub const MEM_RECALL: u8 = b'M';
/// Store the active frequency into a memory channel, followed by the channel
pub const MEM_STORE: u8 = b'm';

/// Filler sent after short queries
pub const PAD: u8 = b'?';

/// US APRS frequency (144.390 MHz)
pub const APRS_US_HZ: u32 = 144_390_000;

//! SRB-MX146LV radio protocol
//!
//! This module contains the command framing, response parsing and the
//! [`Radio`] driver that brackets every exchange with the virtual chip
//! select.

mod driver;
mod frame;
pub mod opcodes;

pub use driver::{Query, Radio, REQUIRES_DOUBLE_TRANSFER, SETTLE_DELAY_MS};
pub use frame::{
    memory_frame, query_frame, set_frequency_frame, FrequencyBounds, MemoryOp, QueryResponse,
    QueryText, FRAME_LEN, MAX_CHANNEL, MEMORY_LEN, PAYLOAD_CAPACITY, SET_FREQ_LEN,
};

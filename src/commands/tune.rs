//! Frequency and memory commands implementation

use habspi_core::radio::opcodes::APRS_US_HZ;
use habspi_core::radio::MemoryOp;

use crate::programmers::RadioHandle;

/// Set the active frequency, optionally checking it against the tuning range
pub fn run_set_frequency(
    radio: &mut RadioHandle,
    hz: u32,
    check: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if check {
        let bounds = radio.frequency_bounds()?;
        if !bounds.contains(hz) {
            return Err(format!(
                "{} Hz is outside the tuning range {} - {} Hz",
                hz, bounds.min_hz, bounds.max_hz
            )
            .into());
        }
        if bounds.step_hz != 0 && (hz - bounds.min_hz) % bounds.step_hz != 0 {
            log::warn!(
                "{} Hz is not a multiple of the {} Hz tuning step",
                hz,
                bounds.step_hz
            );
        }
    }

    radio.set_frequency(hz)?;
    println!("Frequency set to {} Hz", hz);
    Ok(())
}

/// Tune to the US APRS frequency
pub fn run_aprs(radio: &mut RadioHandle) -> Result<(), Box<dyn std::error::Error>> {
    radio.set_aprs_frequency()?;
    println!("Frequency set to {} Hz (APRS)", APRS_US_HZ);
    Ok(())
}

/// Recall or store a memory channel
pub fn run_memory(
    radio: &mut RadioHandle,
    op: MemoryOp,
    channel: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    radio.memory(op, channel)?;
    match op {
        MemoryOp::Recall => println!("Recalled memory channel {}", channel),
        MemoryOp::Store => println!("Stored active frequency in channel {}", channel),
    }
    Ok(())
}

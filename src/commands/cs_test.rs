//! Chip-select exercise
//!
//! Clocks a fixed pattern out on the selected virtual chip select and
//! prints what came back. With a scope on the decoder outputs this shows
//! which line goes low; with a loopback device it shows the bytes return.

use crate::commands::query::format_hex;
use crate::programmers::RadioHandle;

/// Bytes sent by the exercise
pub const TEST_PATTERN: [u8; 4] = *b"****";

/// Run the exercise and return the bytes read back
pub fn run_cs_test(radio: &mut RadioHandle) -> Result<[u8; 4], Box<dyn std::error::Error>> {
    let device = radio.chip_select().active_device();
    let mut read = [0u8; TEST_PATTERN.len()];
    radio.exchange(&TEST_PATTERN, &mut read)?;

    println!("{}: sent {}", device, format_hex(&TEST_PATTERN));
    println!("{}: read {}", device, format_hex(&read));
    if read == TEST_PATTERN {
        println!("Pattern echoed back");
    }
    Ok(read)
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::programmers::open_radio;
    use habspi_core::mux::{DecoderSelectPins, VirtualDeviceId};

    #[test]
    fn test_cs_test_loopback() {
        let mut radio = open_radio(
            "dummy:loopback=A",
            DecoderSelectPins::default(),
            VirtualDeviceId::A,
        )
        .unwrap();
        assert_eq!(run_cs_test(&mut radio).unwrap(), TEST_PATTERN);
    }

    #[test]
    fn test_cs_test_empty_output() {
        let mut radio = open_radio(
            "dummy",
            DecoderSelectPins::default(),
            VirtualDeviceId::D,
        )
        .unwrap();
        assert_eq!(run_cs_test(&mut radio).unwrap(), [0xFF; 4]);
    }
}

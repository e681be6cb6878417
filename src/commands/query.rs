//! Query commands implementation

use habspi_core::radio::Query;

use crate::programmers::RadioHandle;

/// Run a text query and print the decoded answer
pub fn run_text_query(
    radio: &mut RadioHandle,
    query: Query,
) -> Result<(), Box<dyn std::error::Error>> {
    let answer = radio.query_text(query)?;
    if answer.error_code != 0 {
        eprintln!(
            "Radio reported error code 0x{:02X} for {}",
            answer.error_code,
            query.description()
        );
    }
    println!("{}", answer);
    Ok(())
}

/// Print the raw temperature frame as hex bytes
pub fn run_temperature(radio: &mut RadioHandle) -> Result<(), Box<dyn std::error::Error>> {
    let frame = radio.temperature_raw()?;
    println!("{}", format_hex(&frame));
    Ok(())
}

/// Print the tuning range as `min,max,step` in Hz
pub fn run_frequency_range(radio: &mut RadioHandle) -> Result<(), Box<dyn std::error::Error>> {
    let bounds = radio.frequency_bounds()?;
    println!("freq = {}", bounds);
    Ok(())
}

pub(crate) fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0x00, 0x1A, 0xFF]), "00 1A FF");
        assert_eq!(format_hex(&[]), "");
    }
}

//! A minimal ISO 646:1990 (basic G0 set) text codec for the handful of PDU
//! fields that carry plain ASCII text: AE titles, UIDs and the
//! implementation identification sub-items. The dataset itself is never
//! decoded this way, see the crate-level documentation.

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(display("text is not valid basic G0 (ASCII): byte {byte:#x} at offset {offset}"))]
pub struct DecodeTextError {
    byte: u8,
    offset: usize,
}

/// Decode a field encoded in the basic G0 character repertoire.
pub fn decode(bytes: &[u8]) -> Result<String, DecodeTextError> {
    for (offset, &byte) in bytes.iter().enumerate() {
        if byte > 0x7e {
            return DecodeTextSnafu { byte, offset }.fail();
        }
    }
    // non-ASCII control bytes below 0x20 (besides padding) are passed through
    // as-is: trimming is the caller's responsibility.
    Ok(bytes.iter().map(|&b| b as char).collect())
}

/// Encode a string as basic G0 bytes, failing if it is not representable.
pub fn encode(text: &str) -> Result<Vec<u8>, DecodeTextError> {
    let mut out = Vec::with_capacity(text.len());
    for (offset, c) in text.chars().enumerate() {
        if !c.is_ascii() {
            return DecodeTextSnafu {
                byte: c as u32 as u8,
                offset,
            }
            .fail();
        }
        out.push(c as u8);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_ascii() {
        let encoded = encode("ECHOSCU").unwrap();
        assert_eq!(decode(&encoded).unwrap(), "ECHOSCU");
    }

    #[test]
    fn rejects_non_ascii() {
        assert!(encode("café").is_err());
    }
}

//! Cyclic redundancy checks over document bytes.
//!
//! FIT documents use CRC-16/ARC (reflected polynomial `0xA001`, initial value
//! zero). The value is accumulated a nibble at a time, so no lookup table is
//! needed.

use super::error::DecodeError;

const POLYNOMIAL: u16 = 0xA001;

/// Accumulate a slice of bytes into a cyclic redundancy check value.
pub fn compute_crc(init: u16, r: &[u8]) -> u16 {
    r.iter().fold(init, |acc, b| crc_byte(acc, *b))
}

/// Accumulate a single byte, low nibble first.
fn crc_byte(crc: u16, b: u8) -> u16 {
    let crc = crc_nibble(crc, b & 0xF);
    crc_nibble(crc, b >> 4)
}

fn crc_nibble(mut crc: u16, nibble: u8) -> u16 {
    crc ^= u16::from(nibble);
    for _ in 0..4 {
        crc = if crc & 1 != 0 {
            (crc >> 1) ^ POLYNOMIAL
        } else {
            crc >> 1
        };
    }
    crc
}

/// Running checksum over consumed document bytes.
#[derive(Debug, Clone, Default)]
pub struct Crc(u16);

impl Crc {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn update(&mut self, r: &[u8]) {
        self.0 = compute_crc(self.0, r);
    }

    /// The checksum of all bytes seen so far.
    pub fn value(&self) -> u16 {
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Compare against a checksum found in the document.
    ///
    /// A found value of zero means the writer did not compute a checksum and is
    /// always accepted.
    pub fn verify(&self, found: u16) -> Result<(), DecodeError> {
        if found == 0 || found == self.0 {
            Ok(())
        } else {
            Err(DecodeError::ChecksumMismatch {
                found,
                calculated: self.0,
            })
        }
    }
}

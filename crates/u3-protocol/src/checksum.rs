//! Packet checksums.
//!
//! Every packet carries two checksums:
//!
//! ```text
//! +-----------+----------------+---------------+---------------+---------+
//! | 0: csum8  | 1..3: header   | 4: csum16 lo  | 5: csum16 hi  | 6..n    |
//! +-----------+----------------+---------------+---------------+---------+
//! ```
//!
//! `checksum16` covers the payload, `checksum8` covers the header and the
//! checksum16 bytes, so a packet is sealed by filling 4-5 first and 0 last.

use crate::constants::*;

/// Sum of `buf[6..len]`.
///
/// The accumulator is wide enough that it never wraps for any packet the
/// device accepts; callers take the low 16 bits when storing it.
pub fn checksum16(buf: &[u8], len: usize) -> u32 {
    buf[OFFSET_PAYLOAD..len].iter().map(|&b| u32::from(b)).sum()
}

/// Sum of `buf[1..6]` folded into one byte.
pub fn checksum8(buf: &[u8]) -> u8 {
    let mut sum: u32 = buf[OFFSET_HEADER..OFFSET_PAYLOAD]
        .iter()
        .map(|&b| u32::from(b))
        .sum();

    for _ in 0..2 {
        sum = (sum % 256) + (sum / 256);
    }

    (sum & 0xFF) as u8
}

/// Fill in both checksums of a packet whose header and payload are final.
pub fn seal(buf: &mut [u8]) {
    let csum16 = checksum16(buf, buf.len());
    buf[OFFSET_CHECKSUM16_LO] = (csum16 & 0xFF) as u8;
    buf[OFFSET_CHECKSUM16_HI] = ((csum16 / 256) & 0xFF) as u8;
    buf[OFFSET_CHECKSUM8] = checksum8(buf);
}

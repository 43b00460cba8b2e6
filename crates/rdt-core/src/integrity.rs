//! 8-bit ones' complement checksum over `seq || payload`.
//! Detection only, the same fold as the Internet checksum but over bytes.

use rdt_abstract::Bit;

use crate::segment::Segment;

/// Checksum over a one-byte sequence number followed by raw payload bytes.
pub fn checksum(seq: Bit, payload: &[u8]) -> u8 {
    let mut sum: u32 = 0;

    for &byte in std::iter::once(&seq.as_u8()).chain(payload) {
        sum += byte as u32;
        // End-around carry keeps the accumulator within 8 bits.
        sum = (sum & 0xFF) + (sum >> 8);
    }

    !(sum as u8)
}

/// Checksum over the UTF-8 encoding of a text payload.
pub fn compute(seq: Bit, payload: &str) -> u8 {
    checksum(seq, payload.as_bytes())
}

/// Recompute the checksum of a (possibly received) segment and compare.
pub fn verify(segment: &Segment) -> bool {
    compute(segment.seq(), segment.payload()) == segment.integrity()
}

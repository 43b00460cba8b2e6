use rdt_abstract::Bit;
use std::fmt;

use crate::integrity;

/// Acknowledgment as it travels back to the sender: the bit plus the check
/// byte the receiver sealed it with. A channel that flips the bit leaves the
/// check byte behind, so the sender can tell a garbled ACK from a genuine one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    bit: Bit,
    integrity: u8,
}

impl Ack {
    pub fn new(bit: Bit) -> Self {
        Self {
            bit,
            integrity: integrity::checksum(bit, &[]),
        }
    }

    pub fn bit(&self) -> Bit {
        self.bit
    }

    pub fn integrity(&self) -> u8 {
        self.integrity
    }

    /// The same ACK with its bit inverted in transit.
    pub fn flipped(self) -> Self {
        Self {
            bit: self.bit.flip(),
            ..self
        }
    }

    pub fn is_intact(&self) -> bool {
        integrity::checksum(self.bit, &[]) == self.integrity
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bit)
    }
}

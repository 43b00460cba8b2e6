use serde::{Deserialize, Serialize};
use std::fmt;

/// Alternating-bit sequence number. Also used as the acknowledgment value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Bit {
    #[default]
    Zero,
    One,
}

impl Bit {
    /// The complement bit (`b XOR 1`).
    pub fn flip(self) -> Self {
        match self {
            Bit::Zero => Bit::One,
            Bit::One => Bit::Zero,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Bit::Zero => 0,
            Bit::One => 1,
        }
    }
}

impl From<Bit> for u8 {
    fn from(bit: Bit) -> u8 {
        bit.as_u8()
    }
}

impl TryFrom<u8> for Bit {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Bit::Zero),
            1 => Ok(Bit::One),
            other => Err(format!("sequence number must be 0 or 1, got {other}")),
        }
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Outcome of pushing one unit (segment or ACK) through the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery<T> {
    Delivered(T),
    /// Lost in transit. Only the loss-aware variant produces this.
    Dropped,
}

impl<T> Delivery<T> {
    pub fn delivered(self) -> Option<T> {
        match self {
            Delivery::Delivered(value) => Some(value),
            Delivery::Dropped => None,
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, Delivery::Dropped)
    }
}

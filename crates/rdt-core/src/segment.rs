use rdt_abstract::Bit;
use std::fmt;

use crate::error::SegmentError;
use crate::integrity;

/// Field separator of the wire format. Never allowed inside a payload.
pub const DELIMITER: char = '|';

/// One data segment: `"<seq>|<payload>|<integrity>"` on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    seq: Bit,
    payload: String,
    integrity: u8,
}

impl Segment {
    /// Build a fresh segment; the integrity value is computed here.
    pub fn new(seq: Bit, payload: impl Into<String>) -> Result<Self, SegmentError> {
        let payload = payload.into();
        if payload.contains(DELIMITER) {
            return Err(SegmentError::DelimiterInPayload);
        }
        let integrity = integrity::compute(seq, &payload);
        Ok(Self {
            seq,
            payload,
            integrity,
        })
    }

    pub fn seq(&self) -> Bit {
        self.seq
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Integrity value as carried by this segment (computed or received).
    pub fn integrity(&self) -> u8 {
        self.integrity
    }

    pub fn is_intact(&self) -> bool {
        integrity::verify(self)
    }

    pub fn encode(&self) -> String {
        format!(
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.seq, self.payload, self.integrity
        )
    }

    /// Parse wire text. The integrity field is taken as received, not recomputed,
    /// so the caller must still [`Segment::is_intact`] it.
    pub fn decode(text: &str) -> Result<Self, SegmentError> {
        let fields: Vec<&str> = text.split(DELIMITER).collect();
        let &[seq, payload, integrity] = fields.as_slice() else {
            return Err(SegmentError::FieldCount(fields.len()));
        };

        let seq = seq
            .parse::<u8>()
            .ok()
            .and_then(|v| Bit::try_from(v).ok())
            .ok_or_else(|| SegmentError::BadSequence(seq.to_string()))?;
        let integrity = integrity
            .parse::<u8>()
            .map_err(|_| SegmentError::BadIntegrity(integrity.to_string()))?;

        Ok(Self {
            seq,
            payload: payload.to_string(),
            integrity,
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

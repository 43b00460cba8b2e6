use rdt_abstract::{Bit, ConfigError};
use thiserror::Error;

/// Why a piece of wire text is not a usable segment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("payload contains the field delimiter '|'")]
    DelimiterInPayload,
    #[error("expected 3 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid sequence number field {0:?}")]
    BadSequence(String),
    #[error("invalid integrity field {0:?}")]
    BadIntegrity(String),
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("payload is not representable as text: {0}")]
    UnsupportedPayloadEncoding(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Segment(#[from] SegmentError),
    #[error("segment seq={seq} not acknowledged after {attempts} attempts")]
    RetriesExhausted { seq: Bit, attempts: u32 },
}


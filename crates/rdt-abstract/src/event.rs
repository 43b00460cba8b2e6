use serde::Serialize;
use std::fmt;

use crate::bit::Bit;

/// Why the receiver refused a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionKind {
    /// Framing broken: wrong field count or a non-numeric number field.
    Malformed,
    /// Fields parsed but the checksum does not match.
    IntegrityMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetransmitReason {
    /// The segment or its ACK was lost and the timer fired.
    Timeout,
    /// An ACK arrived but carried the wrong bit.
    WrongAck,
    /// An ACK arrived garbled.
    CorruptAck,
}

/// Protocol events emitted by the sender and receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferEvent {
    SegmentSent {
        seq: Bit,
        payload: String,
        attempt: u32,
    },
    SegmentCorrupted {
        kind: CorruptionKind,
        nak: Bit,
    },
    SegmentDropped {
        seq: Bit,
    },
    AckReceived {
        ack: Bit,
        accepted: bool,
    },
    AckCorrupted {
        ack: Bit,
    },
    AckLost {
        seq: Bit,
    },
    Retransmitting {
        seq: Bit,
        attempt: u32,
        reason: RetransmitReason,
    },
    PayloadDelivered {
        seq: Bit,
        payload: String,
    },
    DuplicateDetected {
        seq: Bit,
        ack: Bit,
    },
}

impl fmt::Display for TransferEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferEvent::SegmentSent {
                seq,
                payload,
                attempt,
            } => write!(f, "sender: segment seq={seq} payload={payload:?} (attempt {attempt})"),
            TransferEvent::SegmentCorrupted { kind, nak } => {
                write!(f, "receiver: corrupted segment ({kind:?}), duplicate ACK {nak}")
            }
            TransferEvent::SegmentDropped { seq } => {
                write!(f, "channel: segment seq={seq} lost")
            }
            TransferEvent::AckReceived { ack, accepted } => {
                if *accepted {
                    write!(f, "sender: ACK {ack} accepted")
                } else {
                    write!(f, "sender: ACK {ack} rejected")
                }
            }
            TransferEvent::AckCorrupted { ack } => {
                write!(f, "sender: garbled ACK {ack} ignored")
            }
            TransferEvent::AckLost { seq } => write!(f, "channel: ACK for seq={seq} lost"),
            TransferEvent::Retransmitting {
                seq,
                attempt,
                reason,
            } => write!(f, "sender: retransmitting seq={seq} as attempt {attempt} ({reason:?})"),
            TransferEvent::PayloadDelivered { seq, payload } => {
                write!(f, "receiver: delivered seq={seq} payload={payload:?}")
            }
            TransferEvent::DuplicateDetected { seq, ack } => {
                write!(f, "receiver: duplicate seq={seq}, resending ACK {ack}")
            }
        }
    }
}

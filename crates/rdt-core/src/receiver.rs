use rdt_abstract::{Bit, CorruptionKind, TransferContext, TransferEvent};
use tracing::{debug, info};

use crate::ack::Ack;
use crate::segment::Segment;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverStats {
    pub delivered: u32,
    pub duplicates: u32,
    pub corrupted: u32,
}

/// Receiving side of the alternating-bit protocol.
///
/// Tracks the sequence bit it expects next. A segment that fails to decode or
/// fails its checksum is answered with `expected ^ 1`, the same ACK a duplicate
/// gets, so the sender keeps retransmitting until a clean copy arrives.
///
/// A duplicate is only recognised after it passes the checksum; it is then
/// re-acknowledged with `expected ^ 1` (the bit of the segment that was
/// accepted last) and its payload is not delivered again.
#[derive(Debug, Default)]
pub struct Receiver {
    expected: Bit,
    stats: ReceiverStats,
}

impl Receiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expected(&self) -> Bit {
        self.expected
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// Like [`Receiver::on_segment`], with the answer sealed into an [`Ack`]
    /// ready for the return channel.
    pub fn acknowledge(&mut self, ctx: &mut dyn TransferContext, wire: &str) -> Ack {
        Ack::new(self.on_segment(ctx, wire))
    }

    /// Handle one piece of wire text and return the ACK bit to send back.
    pub fn on_segment(&mut self, ctx: &mut dyn TransferContext, wire: &str) -> Bit {
        let segment = match Segment::decode(wire) {
            Ok(segment) => segment,
            Err(err) => {
                debug!("Undecodable segment {wire:?}: {err}");
                return self.reject(ctx, CorruptionKind::Malformed);
            }
        };

        if !segment.is_intact() {
            debug!("Checksum mismatch on {wire:?}");
            return self.reject(ctx, CorruptionKind::IntegrityMismatch);
        }

        if segment.seq() == self.expected {
            let accepted = self.expected;
            info!("Delivering seq={accepted} ({} bytes)", segment.payload().len());
            ctx.deliver_data(segment.payload());
            ctx.record(TransferEvent::PayloadDelivered {
                seq: accepted,
                payload: segment.payload().to_string(),
            });
            self.stats.delivered = self.stats.delivered.saturating_add(1);
            self.expected = accepted.flip();
            accepted
        } else {
            let ack = self.expected.flip();
            debug!("Duplicate seq={}, re-ACK {ack}", segment.seq());
            ctx.record(TransferEvent::DuplicateDetected {
                seq: segment.seq(),
                ack,
            });
            self.stats.duplicates = self.stats.duplicates.saturating_add(1);
            ack
        }
    }

    fn reject(&mut self, ctx: &mut dyn TransferContext, kind: CorruptionKind) -> Bit {
        let nak = self.expected.flip();
        ctx.record(TransferEvent::SegmentCorrupted { kind, nak });
        self.stats.corrupted = self.stats.corrupted.saturating_add(1);
        nak
    }
}

use rdt_abstract::{
    Bit, Delivery, LinkConfig, RetransmitReason, TransferContext, TransferEvent, Variant,
};
use std::time::Duration;
use tracing::{debug, info};

use crate::channel::UnreliableChannel;
use crate::error::TransferError;
use crate::receiver::Receiver;
use crate::segment::Segment;
use crate::timer::RetransmitTimer;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderConfig {
    pub timeout: Duration,
    /// Cap on transmissions of one segment. `None` retries until acknowledged.
    pub max_attempts: Option<u32>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_attempts: None,
        }
    }
}

impl From<&LinkConfig> for SenderConfig {
    fn from(config: &LinkConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            max_attempts: config.max_attempts,
        }
    }
}

/// Result of one acknowledged transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    pub seq: Bit,
    /// Transmissions needed, the first one included.
    pub attempts: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SenderStats {
    pub segments_sent: u32,
    pub retransmissions: u32,
    pub segments_dropped: u32,
    pub acks_lost: u32,
    pub corrupt_acks: u32,
    pub wrong_acks: u32,
    pub timeouts: u32,
}

/// Stop-and-wait sender. Owns the channel it transmits over and the timer it
/// waits on; exactly one segment is in flight at any time.
pub struct Sender<C, T> {
    seq: Bit,
    channel: C,
    timer: T,
    config: SenderConfig,
    stats: SenderStats,
}

impl<C: UnreliableChannel, T: RetransmitTimer> Sender<C, T> {
    pub fn new(channel: C, timer: T, config: SenderConfig) -> Self {
        Self {
            seq: Bit::Zero,
            channel,
            timer,
            config,
            stats: SenderStats::default(),
        }
    }

    /// Sequence bit the next segment will carry.
    pub fn seq(&self) -> Bit {
        self.seq
    }

    pub fn stats(&self) -> SenderStats {
        self.stats
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Transfer raw bytes. They must be UTF-8, as the wire format is text.
    pub async fn send_bytes(
        &mut self,
        ctx: &mut dyn TransferContext,
        receiver: &mut Receiver,
        payload: &[u8],
    ) -> Result<TransferReceipt, TransferError> {
        let text = std::str::from_utf8(payload)?;
        self.send(ctx, receiver, text).await
    }

    /// Transfer one payload and return once its ACK has been accepted.
    ///
    /// The same encoded segment is retransmitted until the channel hands back
    /// an intact ACK carrying the current sequence bit. A garbled ACK is never
    /// taken at face value. On the loss-aware variant every failed attempt sits
    /// out the retransmission timeout first.
    pub async fn send(
        &mut self,
        ctx: &mut dyn TransferContext,
        receiver: &mut Receiver,
        payload: &str,
    ) -> Result<TransferReceipt, TransferError> {
        let segment = Segment::new(self.seq, payload)?;
        let wire = segment.encode();
        let seq = self.seq;
        let mut attempt: u32 = 1;

        loop {
            self.stats.segments_sent = self.stats.segments_sent.saturating_add(1);
            ctx.record(TransferEvent::SegmentSent {
                seq,
                payload: payload.to_string(),
                attempt,
            });

            let reason = match self.channel.deliver_segment(&wire) {
                Delivery::Dropped => {
                    self.stats.segments_dropped = self.stats.segments_dropped.saturating_add(1);
                    ctx.record(TransferEvent::SegmentDropped { seq });
                    RetransmitReason::Timeout
                }
                Delivery::Delivered(received) => {
                    let ack = receiver.acknowledge(ctx, &received);
                    match self.channel.deliver_ack(ack) {
                        Delivery::Dropped => {
                            self.stats.acks_lost = self.stats.acks_lost.saturating_add(1);
                            ctx.record(TransferEvent::AckLost { seq });
                            RetransmitReason::Timeout
                        }
                        Delivery::Delivered(ack) if !ack.is_intact() => {
                            self.stats.corrupt_acks = self.stats.corrupt_acks.saturating_add(1);
                            debug!("Garbled ACK {ack} for seq={seq}");
                            ctx.record(TransferEvent::AckCorrupted { ack: ack.bit() });
                            RetransmitReason::CorruptAck
                        }
                        Delivery::Delivered(ack) if ack.bit() == seq => {
                            ctx.record(TransferEvent::AckReceived {
                                ack: seq,
                                accepted: true,
                            });
                            info!("ACK {ack} accepted after {attempt} attempt(s)");
                            self.seq = seq.flip();
                            return Ok(TransferReceipt {
                                seq,
                                attempts: attempt,
                            });
                        }
                        Delivery::Delivered(ack) => {
                            self.stats.wrong_acks = self.stats.wrong_acks.saturating_add(1);
                            ctx.record(TransferEvent::AckReceived {
                                ack: ack.bit(),
                                accepted: false,
                            });
                            RetransmitReason::WrongAck
                        }
                    }
                }
            };

            if let Some(max) = self.config.max_attempts
                && attempt >= max
            {
                debug!("Giving up on seq={seq} after {attempt} attempts");
                return Err(TransferError::RetriesExhausted {
                    seq,
                    attempts: attempt,
                });
            }

            // Without loss every attempt is answered synchronously, so there is
            // nothing to wait for unless the channel dropped something anyway.
            if self.channel.variant() == Variant::LossAware
                || reason == RetransmitReason::Timeout
            {
                self.timer.wait(self.config.timeout).await;
                self.stats.timeouts = self.stats.timeouts.saturating_add(1);
            }

            attempt = attempt.saturating_add(1);
            self.stats.retransmissions = self.stats.retransmissions.saturating_add(1);
            ctx.record(TransferEvent::Retransmitting {
                seq,
                attempt,
                reason,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{RandomChannel, ScriptedRandom, SeededRandom};
    use crate::timer::VirtualTimer;
    use rdt_abstract::ChannelConfig;

    fn sender(
        config: ChannelConfig,
        rolls: &[f64],
    ) -> Sender<RandomChannel<ScriptedRandom>, VirtualTimer> {
        let channel = RandomChannel::new(config, ScriptedRandom::new(rolls.iter().copied())).unwrap();
        Sender::new(channel, VirtualTimer::new(), SenderConfig::default())
    }

    #[tokio::test]
    async fn clean_channel_accepts_first_attempt() {
        let mut tx = sender(ChannelConfig::perfect(Variant::LossAware), &[]);
        let mut rx = Receiver::new();
        let mut delivered: Vec<String> = Vec::new();

        let receipt = tx.send(&mut delivered, &mut rx, "hello").await.unwrap();
        assert_eq!(
            receipt,
            TransferReceipt {
                seq: Bit::Zero,
                attempts: 1
            }
        );
        assert_eq!(tx.seq(), Bit::One);
        assert_eq!(tx.timer().expirations(), 0);
        assert_eq!(delivered, vec!["hello"]);
    }

    #[tokio::test]
    async fn lost_segment_waits_for_timeout() {
        // loss roll hits once, then everything passes.
        let mut tx = sender(ChannelConfig::loss_aware(0.5, 0.5, 0.5), &[0.0]);
        let mut rx = Receiver::new();
        let mut delivered: Vec<String> = Vec::new();

        let receipt = tx.send(&mut delivered, &mut rx, "x").await.unwrap();
        assert_eq!(receipt.attempts, 2);
        assert_eq!(tx.stats().segments_dropped, 1);
        assert_eq!(tx.timer().expirations(), 1);
        assert_eq!(tx.timer().elapsed(), Duration::from_secs(2));
        assert_eq!(delivered, vec!["x"]);
    }

    #[tokio::test]
    async fn lost_ack_retransmits_without_redelivery() {
        // segment: loss no, corrupt no; ack: lost.
        let mut tx = sender(
            ChannelConfig::loss_aware(0.5, 0.5, 0.5),
            &[0.9, 0.9, 0.0],
        );
        let mut rx = Receiver::new();
        let mut delivered: Vec<String> = Vec::new();

        let receipt = tx.send(&mut delivered, &mut rx, "x").await.unwrap();
        assert_eq!(receipt.attempts, 2);
        assert_eq!(tx.stats().acks_lost, 1);
        assert_eq!(rx.stats().duplicates, 1);
        assert_eq!(delivered, vec!["x"]);
    }

    #[tokio::test]
    async fn corruption_only_retries_without_timer() {
        let mut tx = sender(ChannelConfig::corruption_only(0.5, 0.0), &[0.0, 0.9]);
        let mut rx = Receiver::new();
        let mut delivered: Vec<String> = Vec::new();

        let receipt = tx.send(&mut delivered, &mut rx, "x").await.unwrap();
        assert_eq!(receipt.attempts, 2);
        assert_eq!(tx.timer().expirations(), 0);
        assert_eq!(tx.stats().wrong_acks, 1);
        assert_eq!(delivered, vec!["x"]);
    }

    #[tokio::test]
    async fn garbled_ack_is_not_taken_at_face_value() {
        // segment clean, ACK flipped; then everything passes.
        let mut tx = sender(ChannelConfig::corruption_only(0.5, 0.5), &[0.9, 0.0]);
        let mut rx = Receiver::new();
        let mut delivered: Vec<String> = Vec::new();

        let receipt = tx.send(&mut delivered, &mut rx, "x").await.unwrap();
        assert_eq!(receipt.attempts, 2);
        assert_eq!(tx.stats().corrupt_acks, 1);
        assert_eq!(tx.stats().wrong_acks, 0);
        assert_eq!(rx.stats().duplicates, 1);
        assert_eq!(delivered, vec!["x"]);
    }

    #[tokio::test]
    async fn flipped_negative_ack_does_not_skip_the_payload() {
        // segment corrupted, its negative ACK flipped into the current bit.
        let mut tx = sender(ChannelConfig::corruption_only(0.5, 0.5), &[0.0, 0.0]);
        let mut rx = Receiver::new();
        let mut delivered: Vec<String> = Vec::new();

        let first = tx.send(&mut delivered, &mut rx, "x").await.unwrap();
        let second = tx.send(&mut delivered, &mut rx, "y").await.unwrap();

        assert_eq!(first.attempts, 2);
        assert_eq!(second.attempts, 1);
        assert_eq!(rx.stats().corrupted, 1);
        assert_eq!(rx.stats().duplicates, 0);
        assert_eq!(delivered, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn retry_cap_gives_up() {
        let channel = RandomChannel::new(
            ChannelConfig::loss_aware(0.0, 0.0, 1.0),
            SeededRandom::from_seed(3),
        )
        .unwrap();
        let config = SenderConfig {
            max_attempts: Some(5),
            ..Default::default()
        };
        let mut tx = Sender::new(channel, VirtualTimer::new(), config);
        let mut rx = Receiver::new();
        let mut delivered: Vec<String> = Vec::new();

        let err = tx.send(&mut delivered, &mut rx, "x").await.unwrap_err();
        assert!(matches!(
            err,
            TransferError::RetriesExhausted {
                seq: Bit::Zero,
                attempts: 5
            }
        ));
        assert_eq!(tx.seq(), Bit::Zero);
        assert_eq!(tx.stats().segments_sent, 5);
        assert!(delivered.is_empty());
    }

    #[tokio::test]
    async fn delimiter_payload_is_rejected_up_front() {
        let mut tx = sender(ChannelConfig::perfect(Variant::LossAware), &[]);
        let mut rx = Receiver::new();
        let mut delivered: Vec<String> = Vec::new();

        let err = tx.send(&mut delivered, &mut rx, "a|b").await.unwrap_err();
        assert!(matches!(err, TransferError::Segment(_)));
        assert_eq!(tx.stats().segments_sent, 0);
        assert_eq!(tx.seq(), Bit::Zero);
    }

    #[tokio::test]
    async fn non_utf8_bytes_are_unsupported() {
        let mut tx = sender(ChannelConfig::perfect(Variant::LossAware), &[]);
        let mut rx = Receiver::new();
        let mut delivered: Vec<String> = Vec::new();

        let err = tx
            .send_bytes(&mut delivered, &mut rx, &[0xff, 0xfe])
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::UnsupportedPayloadEncoding(_)));

        let ok = tx.send_bytes(&mut delivered, &mut rx, b"bytes").await.unwrap();
        assert_eq!(ok.attempts, 1);
        assert_eq!(delivered, vec!["bytes"]);
    }
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rdt_abstract::{Bit, ChannelConfig, ConfigError, Delivery, FaultAction, Variant};
use std::collections::VecDeque;
use tracing::debug;

use crate::ack::Ack;
use crate::segment::{DELIMITER, Segment};

/// The medium between sender and receiver. Each call is one independent
/// transmission; implementations carry no protocol state between calls.
pub trait UnreliableChannel {
    fn variant(&self) -> Variant;

    /// Push encoded segment text through the channel.
    fn deliver_segment(&mut self, encoded: &str) -> Delivery<String>;

    /// Push an acknowledgment back through the channel.
    fn deliver_ack(&mut self, ack: Ack) -> Delivery<Ack>;
}

/// Uniform draws used by [`RandomChannel`].
pub trait RandomSource {
    /// Uniform value in `[0, 1)`.
    fn roll(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_os, Self::from_seed)
    }
}

impl RandomSource for SeededRandom {
    fn roll(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// Replays queued draws so tests can force "corrupt now", "drop now", "flip now".
/// Once the queues run dry, rolls stay just below 1.0 (only a rate of 1.0
/// still fires) and picks return 0.
#[derive(Debug, Default, Clone)]
pub struct ScriptedRandom {
    rolls: VecDeque<f64>,
    picks: VecDeque<usize>,
}

impl ScriptedRandom {
    /// Largest roll that still counts as "below" a rate of 1.0.
    pub const NEVER: f64 = 1.0 - f64::EPSILON;
    /// Roll that is below any non-zero rate.
    pub const ALWAYS: f64 = 0.0;

    pub fn new(rolls: impl IntoIterator<Item = f64>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            picks: VecDeque::new(),
        }
    }

    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn roll(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(Self::NEVER)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.picks.pop_front().unwrap_or(0) % len
    }
}

/// Bump the `nth` non-delimiter character of `text`: ASCII becomes
/// `(code + 1) mod 128`, anything else the next Unicode scalar value.
/// The delimiters stay where they are, so field boundaries survive.
pub fn corrupt_char(text: &str, nth: usize) -> String {
    let mut remaining = nth;
    text.chars()
        .map(|ch| {
            if ch == DELIMITER {
                return ch;
            }
            let hit = remaining == 0;
            remaining = remaining.wrapping_sub(1);
            if hit { bump(ch) } else { ch }
        })
        .collect()
}

fn bump(ch: char) -> char {
    if ch.is_ascii() {
        return char::from((ch as u8 + 1) % 128);
    }
    // Folding a multi-byte character into ASCII can leave its byte sum, and
    // so the checksum, unchanged. The next scalar value never does.
    match ch {
        '\u{D7FF}' => '\u{E000}',
        char::MAX => '\u{80}',
        _ => char::from_u32(ch as u32 + 1).unwrap_or('\u{80}'),
    }
}

fn corrupt_random<R: RandomSource>(rng: &mut R, encoded: &str) -> String {
    let candidates = encoded.chars().filter(|&c| c != DELIMITER).count();
    if candidates == 0 {
        return encoded.to_string();
    }
    let nth = rng.pick(candidates);
    corrupt_char(encoded, nth)
}

/// Probabilistic channel: independent loss, corruption and ACK-flip draws per call.
pub struct RandomChannel<R = SeededRandom> {
    config: ChannelConfig,
    rng: R,
}

impl<R: RandomSource> RandomChannel<R> {
    pub fn new(config: ChannelConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    fn lost(&mut self) -> bool {
        self.config.variant == Variant::LossAware && self.rng.roll() < self.config.loss_rate
    }
}

impl<R: RandomSource> UnreliableChannel for RandomChannel<R> {
    fn variant(&self) -> Variant {
        self.config.variant
    }

    fn deliver_segment(&mut self, encoded: &str) -> Delivery<String> {
        if self.lost() {
            debug!("Segment lost in channel");
            return Delivery::Dropped;
        }
        if self.rng.roll() < self.config.error_rate {
            let corrupted = corrupt_random(&mut self.rng, encoded);
            debug!("Segment corrupted in channel: {encoded:?} -> {corrupted:?}");
            return Delivery::Delivered(corrupted);
        }
        Delivery::Delivered(encoded.to_string())
    }

    fn deliver_ack(&mut self, ack: Ack) -> Delivery<Ack> {
        if self.lost() {
            debug!("ACK {ack} lost in channel");
            return Delivery::Dropped;
        }
        if self.rng.roll() < self.config.ack_error_rate {
            debug!("ACK {ack} flipped in channel");
            return Delivery::Delivered(ack.flipped());
        }
        Delivery::Delivered(ack)
    }
}

/// Applies one-shot deterministic faults before delegating to an inner channel.
pub struct FaultInjector<C> {
    inner: C,
    pending: Vec<FaultAction>,
}

impl<C: UnreliableChannel> FaultInjector<C> {
    pub fn new(inner: C, faults: impl IntoIterator<Item = FaultAction>) -> Self {
        Self {
            inner,
            pending: faults.into_iter().collect(),
        }
    }

    pub fn pending(&self) -> &[FaultAction] {
        &self.pending
    }

    fn take(&mut self, matches: impl Fn(&FaultAction) -> bool) -> Option<FaultAction> {
        let pos = self.pending.iter().position(matches)?;
        Some(self.pending.remove(pos))
    }
}

impl<C: UnreliableChannel> UnreliableChannel for FaultInjector<C> {
    fn variant(&self) -> Variant {
        self.inner.variant()
    }

    fn deliver_segment(&mut self, encoded: &str) -> Delivery<String> {
        if let Ok(segment) = Segment::decode(encoded) {
            let seq = segment.seq();
            let lossy = self.variant() == Variant::LossAware;
            let fault = self.take(|f| match *f {
                FaultAction::DropNextSegment { seq: s } => lossy && s == seq,
                FaultAction::CorruptNextSegment { seq: s } => s == seq,
                _ => false,
            });
            match fault {
                Some(FaultAction::DropNextSegment { .. }) => {
                    debug!("Deterministically dropping segment with seq={seq}");
                    return Delivery::Dropped;
                }
                Some(FaultAction::CorruptNextSegment { .. }) => {
                    debug!("Deterministically corrupting segment with seq={seq}");
                    // First character after the sequence digit.
                    return Delivery::Delivered(corrupt_char(encoded, 1));
                }
                _ => {}
            }
        }
        self.inner.deliver_segment(encoded)
    }

    fn deliver_ack(&mut self, ack: Ack) -> Delivery<Ack> {
        let lossy = self.variant() == Variant::LossAware;
        let bit = ack.bit();
        let fault = self.take(|f| match *f {
            FaultAction::DropNextAck { ack: a } => lossy && a == bit,
            FaultAction::FlipNextAck { ack: a } => a == bit,
            _ => false,
        });
        match fault {
            Some(FaultAction::DropNextAck { .. }) => {
                debug!("Deterministically dropping ACK {ack}");
                Delivery::Dropped
            }
            Some(FaultAction::FlipNextAck { .. }) => {
                debug!("Deterministically flipping ACK {ack}");
                Delivery::Delivered(ack.flipped())
            }
            _ => self.inner.deliver_ack(ack),
        }
    }
}

use rdt_abstract::{ConfigError, FaultAction, LinkConfig, TransferContext};
use std::time::Duration;
use tracing::info;

use crate::channel::{FaultInjector, RandomChannel, SeededRandom, UnreliableChannel};
use crate::error::TransferError;
use crate::receiver::{Receiver, ReceiverStats};
use crate::sender::{Sender, SenderConfig, SenderStats, TransferReceipt};
use crate::timer::RetransmitTimer;

/// Aggregate counters over everything a link has transferred.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    pub sender: SenderStats,
    pub receiver: ReceiverStats,
    pub transfers: u32,
}

/// A sender/receiver pair joined by one channel, driven strictly in
/// request/response order: one message is acknowledged before the next starts.
pub struct Link<C, T> {
    sender: Sender<C, T>,
    receiver: Receiver,
    transfers: u32,
}

impl<T: RetransmitTimer> Link<FaultInjector<RandomChannel<SeededRandom>>, T> {
    /// Random channel built from `config`, with optional deterministic faults in front.
    pub fn from_config(
        config: &LinkConfig,
        faults: impl IntoIterator<Item = FaultAction>,
        timer: T,
    ) -> Result<Self, ConfigError> {
        let channel = RandomChannel::new(config.channel.clone(), SeededRandom::new(config.seed))?;
        Self::new(FaultInjector::new(channel, faults), timer, config)
    }
}

impl<C: UnreliableChannel, T: RetransmitTimer> Link<C, T> {
    pub fn new(channel: C, timer: T, config: &LinkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            sender: Sender::new(channel, timer, SenderConfig::from(config)),
            receiver: Receiver::new(),
            transfers: 0,
        })
    }

    pub fn sender(&self) -> &Sender<C, T> {
        &self.sender
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    pub fn stats(&self) -> LinkStats {
        LinkStats {
            sender: self.sender.stats(),
            receiver: self.receiver.stats(),
            transfers: self.transfers,
        }
    }

    /// Time spent in retransmission timeouts.
    pub fn elapsed(&self) -> Duration {
        self.sender.timer().elapsed()
    }

    pub async fn transfer(
        &mut self,
        ctx: &mut dyn TransferContext,
        payload: &str,
    ) -> Result<TransferReceipt, TransferError> {
        let receipt = self.sender.send(ctx, &mut self.receiver, payload).await?;
        self.transfers = self.transfers.saturating_add(1);
        Ok(receipt)
    }

    /// Transfer every message in order, stopping at the first failed send.
    pub async fn transfer_all<I, S>(
        &mut self,
        ctx: &mut dyn TransferContext,
        messages: I,
    ) -> Result<Vec<TransferReceipt>, TransferError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut receipts = Vec::new();
        for message in messages {
            receipts.push(self.transfer(ctx, message.as_ref()).await?);
        }
        info!(
            "Transferred {} message(s) with {} retransmission(s)",
            receipts.len(),
            self.sender.stats().retransmissions
        );
        Ok(receipts)
    }
}

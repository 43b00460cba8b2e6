use rdt_abstract::{LinkConfig, TransferEvent};
use rdt_core::LinkStats;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub config: LinkConfig,
    pub messages: Vec<String>,
    /// Time spent in retransmission timeouts.
    pub duration_ms: u64,
    pub delivered_data: Vec<String>,
    /// Transmissions per acknowledged message, in order.
    pub attempts: Vec<u32>,
    pub segments_sent: u32,
    pub retransmissions: u32,
    pub segments_dropped: u32,
    pub acks_lost: u32,
    pub corrupt_acks: u32,
    pub corrupted_segments: u32,
    pub duplicates: u32,
    /// Set when a send gave up or was refused.
    pub failure: Option<String>,
    pub events: Vec<TransferEvent>,
}

impl SimulationReport {
    pub fn new(config: LinkConfig, messages: Vec<String>) -> Self {
        Self {
            config,
            messages,
            duration_ms: 0,
            delivered_data: Vec::new(),
            attempts: Vec::new(),
            segments_sent: 0,
            retransmissions: 0,
            segments_dropped: 0,
            acks_lost: 0,
            corrupt_acks: 0,
            corrupted_segments: 0,
            duplicates: 0,
            failure: None,
            events: Vec::new(),
        }
    }

    pub fn absorb_stats(&mut self, stats: &LinkStats) {
        self.segments_sent = stats.sender.segments_sent;
        self.retransmissions = stats.sender.retransmissions;
        self.segments_dropped = stats.sender.segments_dropped;
        self.acks_lost = stats.sender.acks_lost;
        self.corrupt_acks = stats.sender.corrupt_acks;
        self.corrupted_segments = stats.receiver.corrupted;
        self.duplicates = stats.receiver.duplicates;
    }

    pub fn completed(&self) -> bool {
        self.failure.is_none() && self.attempts.len() == self.messages.len()
    }
}

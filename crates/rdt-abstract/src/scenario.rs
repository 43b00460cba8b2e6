use crate::bit::Bit;
use crate::config::{LinkConfig, Variant};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: LinkConfigOverride,
    /// Application messages, transferred in order.
    pub messages: Vec<String>,
    #[serde(default)]
    pub faults: Vec<FaultAction>,
    #[serde(default)]
    pub assertions: Vec<TestAssertion>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LinkConfigOverride {
    pub variant: Option<Variant>,
    pub error_rate: Option<f64>,
    pub ack_error_rate: Option<f64>,
    pub loss_rate: Option<f64>,
    pub timeout_ms: Option<u64>,
    pub max_attempts: Option<u32>,
    pub seed: Option<u64>,
}

impl LinkConfigOverride {
    pub fn apply_to(&self, config: &mut LinkConfig) {
        if let Some(v) = self.variant {
            config.channel.variant = v;
            if v == Variant::CorruptionOnly {
                config.channel.loss_rate = 0.0;
            }
        }
        if let Some(v) = self.error_rate {
            config.channel.error_rate = v;
        }
        if let Some(v) = self.ack_error_rate {
            config.channel.ack_error_rate = v;
        }
        if let Some(v) = self.loss_rate {
            config.channel.loss_rate = v;
        }
        if let Some(v) = self.timeout_ms {
            config.timeout_ms = v;
        }
        if let Some(v) = self.max_attempts {
            config.max_attempts = Some(v);
        }
        if let Some(v) = self.seed {
            config.seed = Some(v);
        }
    }
}

/// Deterministic faults, consumed before the random channel gets a say.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FaultAction {
    /// Drop the next segment carrying `seq`.
    DropNextSegment { seq: Bit },
    /// Corrupt one character of the next segment carrying `seq`.
    CorruptNextSegment { seq: Bit },
    /// Drop the next ACK carrying `ack`.
    DropNextAck { ack: Bit },
    /// Deliver the complement of the next ACK carrying `ack`.
    FlipNextAck { ack: Bit },
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestAssertion {
    /// Assert that specific data was delivered to the application layer
    DataDelivered { data: String },
    /// Assert that every message was delivered exactly once, in order
    DeliveredInOrder,
    /// Assert that the number of segment transmissions is within range
    SegmentCount { min: u32, max: Option<u32> },
    /// Assert that the number of retransmissions is within range
    RetransmissionCount { min: u32, max: Option<u32> },
    /// Assert that the run finishes within the given (simulated) time
    MaxDuration { ms: u64 },
    /// Assert that the sender gave up after hitting `max_attempts`
    RetriesExhausted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_scenario() {
        let scenario: TestScenario = toml::from_str(
            r#"
            name = "lost ack"
            description = "first ACK is dropped"
            messages = ["hello", "world"]

            [config]
            variant = "loss_aware"
            error_rate = 0.0
            seed = 7

            [[faults]]
            type = "drop_next_ack"
            ack = 0

            [[assertions]]
            type = "delivered_in_order"

            [[assertions]]
            type = "retransmission_count"
            min = 1
            max = 1
            "#,
        )
        .unwrap();

        assert_eq!(scenario.messages, vec!["hello", "world"]);
        assert_eq!(scenario.faults, vec![FaultAction::DropNextAck { ack: Bit::Zero }]);
        assert_eq!(scenario.assertions.len(), 2);

        let mut config = LinkConfig::default();
        scenario.config.apply_to(&mut config);
        assert_eq!(config.channel.error_rate, 0.0);
        assert_eq!(config.channel.ack_error_rate, 0.3);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn corruption_only_override_clears_loss() {
        let over = LinkConfigOverride {
            variant: Some(Variant::CorruptionOnly),
            ..Default::default()
        };
        let mut config = LinkConfig::default();
        over.apply_to(&mut config);
        assert_eq!(config.channel.loss_rate, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_sequence_bit() {
        let res: Result<TestScenario, _> = toml::from_str(
            r#"
            name = "bad"
            messages = []
            [[faults]]
            type = "drop_next_segment"
            seq = 2
            "#,
        );
        assert!(res.is_err());
    }
}

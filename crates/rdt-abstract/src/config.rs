use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which member of the stop-and-wait family a link runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Corruption only. Every transmission yields a segment or an ACK, no timer.
    CorruptionOnly,
    /// Corruption plus loss, recovered with a retransmission timer.
    #[default]
    LossAware,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be within [0.0, 1.0], got {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("loss_rate {0} requires the loss-aware variant")]
    LossWithoutTimer(f64),
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub variant: Variant,
    /// Probability that a transmitted segment has one character mutated.
    pub error_rate: f64,
    /// Probability that an ACK arrives as its complement.
    pub ack_error_rate: f64,
    /// Probability that a segment or ACK is dropped. Must be 0 for `CorruptionOnly`.
    pub loss_rate: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::loss_aware(0.2, 0.3, 0.1)
    }
}

impl ChannelConfig {
    pub fn corruption_only(error_rate: f64, ack_error_rate: f64) -> Self {
        Self {
            variant: Variant::CorruptionOnly,
            error_rate,
            ack_error_rate,
            loss_rate: 0.0,
        }
    }

    pub fn loss_aware(error_rate: f64, ack_error_rate: f64, loss_rate: f64) -> Self {
        Self {
            variant: Variant::LossAware,
            error_rate,
            ack_error_rate,
            loss_rate,
        }
    }

    /// A channel that never corrupts, flips or drops anything.
    pub fn perfect(variant: Variant) -> Self {
        Self {
            variant,
            error_rate: 0.0,
            ack_error_rate: 0.0,
            loss_rate: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("error_rate", self.error_rate)?;
        check_rate("ack_error_rate", self.ack_error_rate)?;
        check_rate("loss_rate", self.loss_rate)?;
        if self.variant == Variant::CorruptionOnly && self.loss_rate != 0.0 {
            return Err(ConfigError::LossWithoutTimer(self.loss_rate));
        }
        Ok(())
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    // NaN fails the range check as well.
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { name, value })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub channel: ChannelConfig,
    /// Retransmission timeout in milliseconds (loss-aware variant only).
    pub timeout_ms: u64,
    /// Give up after this many transmissions of one segment. `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Seed for the channel's random source. `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            timeout_ms: 2000,
            max_attempts: None,
            seed: None,
        }
    }
}

impl LinkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.channel.validate()?;
        if self.max_attempts == Some(0) {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(())
    }
}

pub mod bit;
pub mod config;
pub mod event;
pub mod interface;
pub mod scenario;

pub use bit::{Bit, Delivery};
pub use config::{ChannelConfig, ConfigError, LinkConfig, Variant};
pub use event::{CorruptionKind, RetransmitReason, TransferEvent};
pub use interface::TransferContext;
pub use scenario::{FaultAction, LinkConfigOverride, TestAssertion, TestScenario};

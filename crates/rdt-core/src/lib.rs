//! Stop-and-wait reliable data transfer over an unreliable channel.
//! Alternating-bit ARQ with corruption only, or with corruption and loss.

pub mod ack;
pub mod channel;
pub mod error;
pub mod integrity;
pub mod link;
pub mod receiver;
pub mod segment;
pub mod sender;
pub mod timer;

pub use ack::Ack;
pub use channel::{
    FaultInjector, RandomChannel, RandomSource, ScriptedRandom, SeededRandom, UnreliableChannel,
};
pub use error::{SegmentError, TransferError};
pub use link::{Link, LinkStats};
pub use receiver::{Receiver, ReceiverStats};
pub use segment::{DELIMITER, Segment};
pub use sender::{Sender, SenderConfig, SenderStats, TransferReceipt};
pub use timer::{RetransmitTimer, TokioTimer, VirtualTimer};

pub use rdt_abstract::{
    Bit, ChannelConfig, ConfigError, Delivery, LinkConfig, TransferContext, TransferEvent, Variant,
};

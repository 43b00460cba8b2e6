use std::future::Future;
use std::time::Duration;

/// How the sender sits out a retransmission timeout.
pub trait RetransmitTimer {
    /// Suspend until `timeout` has passed.
    fn wait(&mut self, timeout: Duration) -> impl Future<Output = ()>;

    /// Total time spent waiting so far.
    fn elapsed(&self) -> Duration;
}

/// Real-time timer backed by `tokio::time::sleep`.
#[derive(Debug, Default)]
pub struct TokioTimer {
    elapsed: Duration,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RetransmitTimer for TokioTimer {
    async fn wait(&mut self, timeout: Duration) {
        tokio::time::sleep(timeout).await;
        self.elapsed = self.elapsed.saturating_add(timeout);
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Simulated clock: every wait completes immediately and only advances the count.
#[derive(Debug, Default)]
pub struct VirtualTimer {
    elapsed: Duration,
    expirations: u32,
}

impl VirtualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expirations(&self) -> u32 {
        self.expirations
    }
}

impl RetransmitTimer for VirtualTimer {
    async fn wait(&mut self, timeout: Duration) {
        self.elapsed = self.elapsed.saturating_add(timeout);
        self.expirations = self.expirations.saturating_add(1);
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

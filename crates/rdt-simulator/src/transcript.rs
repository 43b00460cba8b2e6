use rdt_abstract::{TransferContext, TransferEvent};
use tracing::info;

/// Context that keeps everything the protocol reports and mirrors it to `tracing`.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    pub delivered_data: Vec<String>,
    pub events: Vec<TransferEvent>,
    quiet: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record without logging each event.
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    pub fn count(&self, matches: impl Fn(&TransferEvent) -> bool) -> usize {
        self.events.iter().filter(|e| matches(e)).count()
    }
}

impl TransferContext for Transcript {
    fn deliver_data(&mut self, payload: &str) {
        if !self.quiet {
            info!("[Application] DELIVERED DATA: {payload:?}");
        }
        self.delivered_data.push(payload.to_string());
    }

    fn record(&mut self, event: TransferEvent) {
        if !self.quiet {
            info!("{event}");
        }
        self.events.push(event);
    }
}

use crate::event::TransferEvent;

/// The capability the surrounding program hands to the sender and receiver.
/// Protocol code never prints; it reports through this trait instead.
pub trait TransferContext {
    /// Hand a freshly accepted payload to the application layer.
    fn deliver_data(&mut self, payload: &str);

    /// Observe a protocol event.
    fn record(&mut self, _event: TransferEvent) {
        // Default no-op so plain sinks don't need to care.
    }
}

/// A bare list of payloads is the simplest application sink.
impl TransferContext for Vec<String> {
    fn deliver_data(&mut self, payload: &str) {
        self.push(payload.to_string());
    }
}

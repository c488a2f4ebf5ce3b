//! Availability broadcast bus between contexts.

use pendrive_core::AvailabilityEvent;
use tokio::sync::broadcast;

/// Room for bursts of edges while a slow receiver catches up.
const BUS_CAPACITY: usize = 16;

/// Fire-and-forget fan-out of availability edges.
///
/// Publishing never blocks and never fails from the sender's point of view:
/// a send with no live subscriber (popup closed, every page navigated away)
/// is silently dropped.
#[derive(Debug, Clone)]
pub struct AvailabilityBus {
    tx: broadcast::Sender<AvailabilityEvent>,
}

impl Default for AvailabilityBus {
    fn default() -> Self {
        Self::new()
    }
}

impl AvailabilityBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AvailabilityEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: AvailabilityEvent) {
        match self.tx.send(event) {
            Ok(receivers) => tracing::debug!("broadcast {event:?} to {receivers} contexts"),
            Err(_) => tracing::debug!("broadcast {event:?} dropped: no live contexts"),
        }
    }

    pub fn subscribers(&self) -> usize {
        self.tx.receiver_count()
    }
}

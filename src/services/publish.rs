//! Fire-and-forget fan-out of tick payloads to subscribers.

use crate::models::TickPayload;
use tokio::sync::broadcast;
use tracing::debug;

/// Push transport for tick payloads. No delivery acknowledgment; a failure
/// to reach one subscriber never propagates back into the tick loop.
pub trait Publisher: Send + Sync {
    fn broadcast(&self, payload: &TickPayload);
}

/// Publisher backed by a `tokio::sync::broadcast` channel. Each WebSocket
/// connection holds its own receiver; slow subscribers lag and drop on their
/// own without affecting the sender.
pub struct BroadcastPublisher {
    tx: broadcast::Sender<TickPayload>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn sender(&self) -> broadcast::Sender<TickPayload> {
        self.tx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TickPayload> {
        self.tx.subscribe()
    }
}

impl Publisher for BroadcastPublisher {
    fn broadcast(&self, payload: &TickPayload) {
        // send only fails when there are zero receivers, which is fine.
        if self.tx.send(payload.clone()).is_err() {
            debug!("no subscribers connected, payload dropped");
        }
    }
}

//! In-process event sink over a tokio broadcast channel
//!
//! Used when no Redis is configured. Subscribers that fall behind lose the
//! oldest events; the ledger never waits on them.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use tracker_core::{DomainError, DomainEvent, EventSink};

/// Default channel capacity
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<DomainEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

#[async_trait]
impl EventSink for BroadcastEventSink {
    async fn emit(&self, event: DomainEvent) -> Result<(), DomainError> {
        // No subscribers is not an error
        let receivers = self.sender.send(event).unwrap_or(0);
        trace!(receivers, "Broadcast domain event");
        Ok(())
    }
}

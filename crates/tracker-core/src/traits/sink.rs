//! Event sink port - where domain events go after a ledger mutation

use async_trait::async_trait;

use crate::error::DomainError;
use crate::events::DomainEvent;

/// Consumer of the domain event stream (log channels, embeds, audit).
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event. Failing to deliver never rolls back the ledger.
    async fn emit(&self, event: DomainEvent) -> Result<(), DomainError>;
}

//! Business logic services
//!
//! The reconciliation service is the entry point for notifications; the
//! ledger service owns counter bookkeeping; the serializer orders work per
//! community.

pub mod context;
pub mod error;
pub mod events;
pub mod ledger;
pub mod reconciliation;
pub mod serializer;
pub mod tracking;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export all services for convenience
pub use context::{TrackerContext, TrackerContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use events::{BroadcastEventSink, DEFAULT_EVENT_BUFFER};
pub use ledger::{LedgerService, DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT};
pub use reconciliation::{
    InviteNotification, JoinNotification, JoinOutcome, LeaveNotification, PopulateReport,
    ReconciliationService,
};
pub use serializer::{CommunitySerializer, QueueSlot, SerializerError};
pub use tracking::{TrackingRegistry, TrackingStatus};

//! Domain events

mod domain_event;

pub use domain_event::{
    BonusAdjustedEvent, DomainEvent, JoinAttributedEvent, MemberLeftEvent, StatsResetEvent,
    TrackingStatusChangedEvent,
};

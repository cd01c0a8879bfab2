//! # tracker-core
//!
//! Domain layer for invite attribution: entities, the attribution engine,
//! ports, domain errors and domain events.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod engine;
pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use engine::{attribute, candidate_count, uses_regressions};
pub use entities::{
    leaderboard_order, Attribution, AttributionKind, CommunitySnapshot, InviteSnapshot,
    InviteStats, LeaderboardEntry, NewUsageRecord, StatsDelta, StatsSummary, UnknownReason,
    UsageRecord, VanitySnapshot,
};
pub use error::DomainError;
pub use events::DomainEvent;
pub use traits::{
    EventSink, FakeAccountPolicy, FetchError, LedgerRepository, MinAccountAge, NeverFake,
    RepoResult, SnapshotFetcher,
};
pub use value_objects::{InviterKey, Snowflake, SnowflakeParseError};

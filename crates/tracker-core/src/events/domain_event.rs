//! Domain events - events emitted when tracking state changes
//!
//! These events are used for:
//! - Join/leave log channels and welcome embeds (external collaborators)
//! - Audit logging of administrative corrections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Attribution, AttributionKind, UnknownReason, UsageRecord};
use crate::value_objects::{InviterKey, Snowflake};

/// All possible domain events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    JoinAttributed(JoinAttributedEvent),
    MemberLeft(MemberLeftEvent),
    BonusAdjusted(BonusAdjustedEvent),
    StatsReset(StatsResetEvent),
    TrackingStatusChanged(TrackingStatusChangedEvent),
}

impl DomainEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::JoinAttributed(_) => "JOIN_ATTRIBUTED",
            Self::MemberLeft(_) => "MEMBER_LEFT",
            Self::BonusAdjusted(_) => "BONUS_ADJUSTED",
            Self::StatsReset(_) => "STATS_RESET",
            Self::TrackingStatusChanged(_) => "TRACKING_STATUS_CHANGED",
        }
    }

    /// Community the event belongs to
    pub fn community_id(&self) -> Snowflake {
        match self {
            Self::JoinAttributed(e) => e.community_id,
            Self::MemberLeft(e) => e.community_id,
            Self::BonusAdjusted(e) => e.community_id,
            Self::StatsReset(e) => e.community_id,
            Self::TrackingStatusChanged(e) => e.community_id,
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::JoinAttributed(e) => e.timestamp,
            Self::MemberLeft(e) => e.timestamp,
            Self::BonusAdjusted(e) => e.timestamp,
            Self::StatsReset(e) => e.timestamp,
            Self::TrackingStatusChanged(e) => e.timestamp,
        }
    }
}

// ============================================================================
// Event Structs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinAttributedEvent {
    pub community_id: Snowflake,
    pub user_id: Snowflake,
    pub attribution_kind: AttributionKind,
    pub inviter_id: Option<Snowflake>,
    pub code: Option<String>,
    pub ambiguous: bool,
    pub unknown_reason: Option<UnknownReason>,
    pub fake: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberLeftEvent {
    pub community_id: Snowflake,
    pub user_id: Snowflake,
    pub attribution_kind: AttributionKind,
    pub inviter_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusAdjustedEvent {
    pub community_id: Snowflake,
    pub inviter_id: Snowflake,
    pub delta: i64,
    pub bonus: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResetEvent {
    pub community_id: Snowflake,
    /// None = every inviter in the community
    pub inviter_id: Option<Snowflake>,
    pub rows: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStatusChangedEvent {
    pub community_id: Snowflake,
    pub enabled: bool,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Event Creation Helpers
// ============================================================================

impl JoinAttributedEvent {
    pub fn new(
        community_id: Snowflake,
        user_id: Snowflake,
        attribution: &Attribution,
        fake: bool,
    ) -> Self {
        let inviter_id = match attribution {
            Attribution::Normal { inviter_id, .. } => *inviter_id,
            _ => None,
        };
        Self {
            community_id,
            user_id,
            attribution_kind: attribution.kind(),
            inviter_id,
            code: attribution.code().map(String::from),
            ambiguous: attribution.is_ambiguous(),
            unknown_reason: attribution.unknown_reason(),
            fake,
            timestamp: Utc::now(),
        }
    }
}

impl MemberLeftEvent {
    pub fn from_record(record: &UsageRecord) -> Self {
        Self {
            community_id: record.community_id,
            user_id: record.user_id,
            attribution_kind: record.kind,
            inviter_id: record.inviter.and_then(|key| key.user_id()),
            timestamp: record.left_at.unwrap_or_else(Utc::now),
        }
    }
}

impl BonusAdjustedEvent {
    pub fn new(community_id: Snowflake, inviter_id: Snowflake, delta: i64, bonus: i64) -> Self {
        Self {
            community_id,
            inviter_id,
            delta,
            bonus,
            timestamp: Utc::now(),
        }
    }
}

impl StatsResetEvent {
    pub fn new(community_id: Snowflake, inviter: Option<InviterKey>, rows: u64) -> Self {
        Self {
            community_id,
            inviter_id: inviter.and_then(|key| key.user_id()),
            rows,
            timestamp: Utc::now(),
        }
    }
}

impl TrackingStatusChangedEvent {
    pub fn new(community_id: Snowflake, enabled: bool) -> Self {
        Self {
            community_id,
            enabled,
            timestamp: Utc::now(),
        }
    }
}

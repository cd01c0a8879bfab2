//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.
//! Snowflake IDs are serialized as strings for JavaScript compatibility.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracker_core::{AttributionKind, UnknownReason};

use crate::services::TrackingStatus;

// ============================================================================
// Common Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Attribution Responses
// ============================================================================

/// How a join was attributed
#[derive(Debug, Clone, Serialize)]
pub struct AttributionResponse {
    pub kind: AttributionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inviter_id: Option<String>,
    pub ambiguous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnknownReason>,
}

/// Result of a member-join notification
#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    pub user_id: String,
    pub attribution: AttributionResponse,
    pub fake: bool,
    pub joined_at: DateTime<Utc>,
}

/// Result of a member-leave notification
#[derive(Debug, Clone, Serialize)]
pub struct LeaveResponse {
    pub user_id: String,
    /// False if the member had no open usage record
    pub closed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<UsageRecordResponse>,
}

/// Listing cached after an invite create/delete notification
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub invites: usize,
    pub vanity: bool,
}

/// One usage record
#[derive(Debug, Clone, Serialize)]
pub struct UsageRecordResponse {
    pub id: i64,
    pub user_id: String,
    /// Absent for vanity and unknown joins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inviter_id: Option<String>,
    pub vanity: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub kind: AttributionKind,
    pub ambiguous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_reason: Option<UnknownReason>,
    pub fake: bool,
    pub joined_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_at: Option<DateTime<Utc>>,
    pub account_age_days: i64,
}

/// Who invited a member
#[derive(Debug, Clone, Serialize)]
pub struct InviterResponse {
    pub user_id: String,
    /// None when the member is not in the ledger
    pub record: Option<UsageRecordResponse>,
}

// ============================================================================
// Stats Responses
// ============================================================================

/// Counters for one inviter
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub community_id: String,
    pub user_id: String,
    pub regular: i64,
    pub bonus: i64,
    pub leaves: i64,
    pub fake: i64,
    pub total: i64,
}

/// One leaderboard row
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntryResponse {
    pub rank: usize,
    pub inviter_id: String,
    pub regular: i64,
    pub bonus: i64,
    pub leaves: i64,
    pub fake: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardResponse {
    pub community_id: String,
    pub entries: Vec<LeaderboardEntryResponse>,
}

/// Rows touched by a reset
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub community_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub rows: u64,
}

// ============================================================================
// Community Responses
// ============================================================================

/// Whether invite tracking works in a community
#[derive(Debug, Clone, Serialize)]
pub struct TrackingResponse {
    pub community_id: String,
    pub status: TrackingStatus,
    /// Invites in the cached listing; absent before the first fetch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_invites: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvictResponse {
    pub community_id: String,
    pub evicted: bool,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Health check status for each backing service
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub database: String,
    pub redis: String,
}

fn check_status(check: Option<bool>) -> &'static str {
    match check {
        Some(true) => "healthy",
        Some(false) => "unhealthy",
        None => "not_configured",
    }
}

impl ReadinessResponse {
    /// `None` means the backing service is not configured and does not
    /// count against readiness.
    pub fn ready(database: Option<bool>, redis: Option<bool>) -> Self {
        let all_healthy = database != Some(false) && redis != Some(false);
        Self {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                database: check_status(database).to_string(),
                redis: check_status(redis).to_string(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs, and
//! turns validated requests into service notifications.

use chrono::Utc;
use tracker_core::{Attribution, CommunitySnapshot, LeaderboardEntry, Snowflake, UsageRecord};

use crate::services::{InviteNotification, JoinNotification, JoinOutcome, LeaveNotification};

use super::requests::{InviteEventRequest, MemberJoinRequest, MemberLeaveRequest};
use super::responses::{
    AttributionResponse, JoinResponse, LeaderboardEntryResponse, RefreshResponse,
    UsageRecordResponse,
};

// ============================================================================
// Attribution Mappers
// ============================================================================

impl From<&Attribution> for AttributionResponse {
    fn from(attribution: &Attribution) -> Self {
        let inviter_id = match attribution {
            Attribution::Normal { inviter_id, .. } => inviter_id.map(|id| id.to_string()),
            _ => None,
        };
        Self {
            kind: attribution.kind(),
            code: attribution.code().map(String::from),
            inviter_id,
            ambiguous: attribution.is_ambiguous(),
            reason: attribution.unknown_reason(),
        }
    }
}

impl From<&JoinOutcome> for JoinResponse {
    fn from(outcome: &JoinOutcome) -> Self {
        Self {
            user_id: outcome.record.user_id.to_string(),
            attribution: AttributionResponse::from(&outcome.attribution),
            fake: outcome.record.fake,
            joined_at: outcome.record.joined_at,
        }
    }
}

impl From<JoinOutcome> for JoinResponse {
    fn from(outcome: JoinOutcome) -> Self {
        Self::from(&outcome)
    }
}

impl From<&CommunitySnapshot> for RefreshResponse {
    fn from(listing: &CommunitySnapshot) -> Self {
        Self {
            invites: listing.invites.len(),
            vanity: listing.vanity.is_some(),
        }
    }
}

// ============================================================================
// Ledger Mappers
// ============================================================================

impl From<&UsageRecord> for UsageRecordResponse {
    fn from(record: &UsageRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id.to_string(),
            inviter_id: record.inviter.and_then(|key| key.user_id()).map(|id| id.to_string()),
            vanity: record.inviter.is_some_and(|key| key.is_vanity()),
            code: record.invite_code.clone(),
            kind: record.kind,
            ambiguous: record.ambiguous,
            unknown_reason: record.unknown_reason,
            fake: record.fake,
            joined_at: record.joined_at,
            left_at: record.left_at,
            account_age_days: record.account_age_days,
        }
    }
}

impl From<UsageRecord> for UsageRecordResponse {
    fn from(record: UsageRecord) -> Self {
        Self::from(&record)
    }
}

impl From<&LeaderboardEntry> for LeaderboardEntryResponse {
    fn from(entry: &LeaderboardEntry) -> Self {
        Self {
            rank: entry.rank,
            inviter_id: entry.inviter_id.to_string(),
            regular: entry.stats.regular,
            bonus: entry.stats.bonus,
            leaves: entry.stats.leaves,
            fake: entry.stats.fake,
            total: entry.stats.total,
        }
    }
}

// ============================================================================
// Request Mappers
// ============================================================================

impl MemberJoinRequest {
    /// Fill in defaults: account age from the user id, join time from now
    pub fn into_notification(self, community_id: Snowflake) -> JoinNotification {
        JoinNotification {
            community_id,
            user_id: self.user_id,
            account_created_at: self
                .account_created_at
                .unwrap_or_else(|| self.user_id.created_at()),
            joined_at: self.joined_at.unwrap_or_else(Utc::now),
        }
    }
}

impl MemberLeaveRequest {
    pub fn into_notification(self, community_id: Snowflake) -> LeaveNotification {
        LeaveNotification {
            community_id,
            user_id: self.user_id,
            left_at: self.left_at.unwrap_or_else(Utc::now),
        }
    }
}

impl InviteEventRequest {
    pub fn into_notification(self, community_id: Snowflake) -> InviteNotification {
        InviteNotification {
            community_id,
            code: self.code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::{InviterKey, NewUsageRecord, StatsSummary, UnknownReason};

    #[test]
    fn test_vanity_record_response() {
        let now = Utc::now();
        let record = NewUsageRecord::from_attribution(
            Snowflake::new(1),
            Snowflake::new(2),
            &Attribution::Vanity { code: "cool".to_string() },
            now,
            now,
        )
        .into_record(5);

        let response = UsageRecordResponse::from(&record);
        assert!(response.vanity);
        assert!(response.inviter_id.is_none());
        assert_eq!(response.code.as_deref(), Some("cool"));
        assert_eq!(record.inviter, Some(InviterKey::Vanity));
    }

    #[test]
    fn test_refresh_response_from_listing() {
        let listing = CommunitySnapshot::fetched(
            vec![tracker_core::InviteSnapshot::new("a", 1, None)],
            Some(tracker_core::VanitySnapshot::new("cool", 3)),
        );
        let response = RefreshResponse::from(&listing);
        assert_eq!(response.invites, 1);
        assert!(response.vanity);
    }

    #[test]
    fn test_unknown_attribution_response() {
        let response = AttributionResponse::from(&Attribution::unknown(UnknownReason::TrackingDisabled));
        assert!(response.inviter_id.is_none());
        assert_eq!(response.reason, Some(UnknownReason::TrackingDisabled));
    }

    #[test]
    fn test_leaderboard_entry_response() {
        let entry = LeaderboardEntry {
            rank: 1,
            inviter_id: Snowflake::new(99),
            stats: StatsSummary {
                regular: 5,
                bonus: 1,
                leaves: 2,
                fake: 0,
                total: 4,
            },
        };
        let response = LeaderboardEntryResponse::from(&entry);
        assert_eq!(response.inviter_id, "99");
        assert_eq!(response.total, 4);
    }

    #[test]
    fn test_join_request_defaults() {
        let user = Snowflake::new(175_928_847_299_117_063);
        let request = MemberJoinRequest {
            user_id: user,
            account_created_at: None,
            joined_at: None,
        };
        let notification = request.into_notification(Snowflake::new(1));
        assert_eq!(notification.account_created_at, user.created_at());
        assert!(notification.joined_at >= notification.account_created_at);
    }
}

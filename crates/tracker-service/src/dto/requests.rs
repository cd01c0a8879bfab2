//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.
//! Snowflake IDs are accepted as strings or numbers.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracker_core::Snowflake;
use validator::{Validate, ValidationError};

use crate::services::DEFAULT_LEADERBOARD_LIMIT;

// ============================================================================
// Membership Events
// ============================================================================

/// A member joined the community
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MemberJoinRequest {
    #[validate(custom(function = "validate_snowflake"))]
    pub user_id: Snowflake,

    /// Defaults to the creation time encoded in the user id
    pub account_created_at: Option<DateTime<Utc>>,

    /// Defaults to the time the request is handled
    pub joined_at: Option<DateTime<Utc>>,
}

/// A member left the community
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MemberLeaveRequest {
    #[validate(custom(function = "validate_snowflake"))]
    pub user_id: Snowflake,

    pub left_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Invite Events
// ============================================================================

/// An invite was created or deleted
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct InviteEventRequest {
    #[validate(length(min = 1, max = 64, message = "Invite code must be 1-64 characters"))]
    pub code: Option<String>,
}

// ============================================================================
// Stats Requests
// ============================================================================

/// Manual bonus adjustment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BonusRequest {
    #[validate(
        range(min = -1_000_000, max = 1_000_000, message = "Delta must be within ±1000000"),
        custom(function = "validate_nonzero")
    )]
    pub delta: i64,
}

/// Leaderboard query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardQuery {
    /// Clamped to 1-100 by the service
    pub limit: Option<i64>,
}

impl LeaderboardQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
    }
}

/// Guard for the community-wide reset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetAllQuery {
    #[serde(default)]
    pub confirm: bool,
}

// ============================================================================
// Custom Validators
// ============================================================================

fn validate_snowflake(id: &Snowflake) -> Result<(), ValidationError> {
    if id.into_inner() <= 0 {
        let mut err = ValidationError::new("snowflake");
        err.message = Some("ID must be a positive snowflake".into());
        return Err(err);
    }
    Ok(())
}

fn validate_nonzero(delta: i64) -> Result<(), ValidationError> {
    if delta == 0 {
        let mut err = ValidationError::new("nonzero");
        err.message = Some("Delta must not be zero".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_request_accepts_string_ids() {
        let req: MemberJoinRequest =
            serde_json::from_str(r#"{"user_id": "175928847299117063"}"#).unwrap();
        assert_eq!(req.user_id, Snowflake::new(175928847299117063));
        assert!(req.account_created_at.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_join_request_rejects_zero_id() {
        let req: MemberJoinRequest = serde_json::from_str(r#"{"user_id": 0}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_bonus_request_validation() {
        let ok: BonusRequest = serde_json::from_str(r#"{"delta": -3}"#).unwrap();
        assert!(ok.validate().is_ok());

        let zero: BonusRequest = serde_json::from_str(r#"{"delta": 0}"#).unwrap();
        assert!(zero.validate().is_err());

        let huge: BonusRequest = serde_json::from_str(r#"{"delta": 5000000}"#).unwrap();
        assert!(huge.validate().is_err());
    }

    #[test]
    fn test_validate_nonzero() {
        assert!(validate_nonzero(1).is_ok());
        assert!(validate_nonzero(-1).is_ok());
        let err = validate_nonzero(0).unwrap_err();
        assert_eq!(err.code, "nonzero");
    }

    #[test]
    fn test_invite_event_code_optional() {
        let req: InviteEventRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_ok());

        let req: InviteEventRequest = serde_json::from_str(r#"{"code": ""}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_query_defaults() {
        assert_eq!(LeaderboardQuery::default().limit(), DEFAULT_LEADERBOARD_LIMIT);
        assert!(!ResetAllQuery::default().confirm);
    }
}

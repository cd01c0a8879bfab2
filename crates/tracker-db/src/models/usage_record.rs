//! Usage record database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for usage_records table
#[derive(Debug, Clone, FromRow)]
pub struct UsageRecordModel {
    pub id: i64,
    pub community_id: i64,
    pub user_id: i64,
    pub inviter_id: Option<i64>,
    pub invite_code: Option<String>,
    pub attribution_kind: String,
    pub ambiguous: bool,
    pub unknown_reason: Option<String>,
    pub fake: bool,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub account_age_days: i64,
}

impl UsageRecordModel {
    /// Check if the member is still in the community
    #[inline]
    pub fn is_open(&self) -> bool {
        self.left_at.is_none()
    }
}

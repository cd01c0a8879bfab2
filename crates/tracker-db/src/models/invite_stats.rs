//! Invite stats database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for invite_stats table
#[derive(Debug, Clone, FromRow)]
pub struct InviteStatsModel {
    pub community_id: i64,
    pub inviter_id: i64,
    pub regular: i64,
    pub bonus: i64,
    pub leaves: i64,
    pub fake: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

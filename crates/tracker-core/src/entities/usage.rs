//! Usage record entity - the audit trail of who joined through what

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attribution::{Attribution, AttributionKind, UnknownReason};
use crate::value_objects::{InviterKey, Snowflake};

/// One stay of one user in one community
///
/// At most one record per (community, user) is open (`left_at` is None).
/// Leaving closes the record; a re-join opens a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: i64,
    pub community_id: Snowflake,
    pub user_id: Snowflake,
    pub inviter: Option<InviterKey>,
    pub invite_code: Option<String>,
    pub kind: AttributionKind,
    pub ambiguous: bool,
    pub unknown_reason: Option<UnknownReason>,
    pub fake: bool,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub account_age_days: i64,
}

impl UsageRecord {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.left_at.is_none()
    }

    /// Whether this stay was credited to an inviter in `invite_stats`
    #[inline]
    pub fn credits_inviter(&self) -> bool {
        matches!(self.kind, AttributionKind::Normal | AttributionKind::Vanity)
            && self.inviter.is_some()
    }
}

/// Values for inserting a new usage record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUsageRecord {
    pub community_id: Snowflake,
    pub user_id: Snowflake,
    pub inviter: Option<InviterKey>,
    pub invite_code: Option<String>,
    pub kind: AttributionKind,
    pub ambiguous: bool,
    pub unknown_reason: Option<UnknownReason>,
    pub fake: bool,
    pub joined_at: DateTime<Utc>,
    pub account_age_days: i64,
}

impl NewUsageRecord {
    /// Build the record for an attributed join
    pub fn from_attribution(
        community_id: Snowflake,
        user_id: Snowflake,
        attribution: &Attribution,
        joined_at: DateTime<Utc>,
        account_created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            community_id,
            user_id,
            inviter: attribution.inviter_key(),
            invite_code: attribution.code().map(String::from),
            kind: attribution.kind(),
            ambiguous: attribution.is_ambiguous(),
            unknown_reason: attribution.unknown_reason(),
            fake: false,
            joined_at,
            account_age_days: (joined_at - account_created_at).num_days().max(0),
        }
    }

    pub fn with_fake(mut self, fake: bool) -> Self {
        self.fake = fake;
        self
    }

    /// Materialize with a storage-assigned id
    pub fn into_record(self, id: i64) -> UsageRecord {
        UsageRecord {
            id,
            community_id: self.community_id,
            user_id: self.user_id,
            inviter: self.inviter,
            invite_code: self.invite_code,
            kind: self.kind,
            ambiguous: self.ambiguous,
            unknown_reason: self.unknown_reason,
            fake: self.fake,
            joined_at: self.joined_at,
            left_at: None,
            account_age_days: self.account_age_days,
        }
    }
}

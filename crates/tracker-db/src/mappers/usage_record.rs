//! UsageRecord entity <-> model mapper

use tracker_core::entities::{AttributionKind, NewUsageRecord, UnknownReason, UsageRecord};
use tracker_core::value_objects::{InviterKey, Snowflake};

use crate::models::UsageRecordModel;

/// Convert UsageRecordModel to UsageRecord entity
impl From<UsageRecordModel> for UsageRecord {
    fn from(model: UsageRecordModel) -> Self {
        UsageRecord {
            id: model.id,
            community_id: Snowflake::new(model.community_id),
            user_id: Snowflake::new(model.user_id),
            inviter: model.inviter_id.map(InviterKey::from_storage_id),
            invite_code: model.invite_code,
            // The CHECK constraint keeps unexpected kinds out of the table
            kind: AttributionKind::parse(&model.attribution_kind).unwrap_or(AttributionKind::Unknown),
            ambiguous: model.ambiguous,
            unknown_reason: model.unknown_reason.as_deref().and_then(UnknownReason::parse),
            fake: model.fake,
            joined_at: model.joined_at,
            left_at: model.left_at,
            account_age_days: model.account_age_days,
        }
    }
}

/// Column values for inserting a usage record
pub struct UsageRecordInsert<'a> {
    pub community_id: i64,
    pub user_id: i64,
    pub inviter_id: Option<i64>,
    pub invite_code: Option<&'a str>,
    pub attribution_kind: &'static str,
    pub ambiguous: bool,
    pub unknown_reason: Option<&'static str>,
    pub fake: bool,
    pub joined_at: chrono::DateTime<chrono::Utc>,
    pub account_age_days: i64,
}

impl<'a> UsageRecordInsert<'a> {
    pub fn new(record: &'a NewUsageRecord) -> Self {
        Self {
            community_id: record.community_id.into_inner(),
            user_id: record.user_id.into_inner(),
            inviter_id: record.inviter.map(|key| key.storage_id()),
            invite_code: record.invite_code.as_deref(),
            attribution_kind: record.kind.as_str(),
            ambiguous: record.ambiguous,
            unknown_reason: record.unknown_reason.map(|reason| reason.as_str()),
            fake: record.fake,
            joined_at: record.joined_at,
            account_age_days: record.account_age_days,
        }
    }
}

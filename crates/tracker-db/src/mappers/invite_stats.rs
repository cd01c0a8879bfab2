//! InviteStats entity <-> model mapper

use tracker_core::entities::InviteStats;
use tracker_core::value_objects::{InviterKey, Snowflake};

use crate::models::InviteStatsModel;

/// Convert InviteStatsModel to InviteStats entity
impl From<InviteStatsModel> for InviteStats {
    fn from(model: InviteStatsModel) -> Self {
        InviteStats {
            community_id: Snowflake::new(model.community_id),
            inviter: InviterKey::from_storage_id(model.inviter_id),
            regular: model.regular,
            bonus: model.bonus,
            leaves: model.leaves,
            fake: model.fake,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

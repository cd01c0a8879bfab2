//! Domain entities - core business objects

mod attribution;
mod snapshot;
mod stats;
mod usage;

pub use attribution::{Attribution, AttributionKind, UnknownReason};
pub use snapshot::{CommunitySnapshot, InviteSnapshot, VanitySnapshot};
pub use stats::{leaderboard_order, InviteStats, LeaderboardEntry, StatsDelta, StatsSummary};
pub use usage::{NewUsageRecord, UsageRecord};

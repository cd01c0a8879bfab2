//! Database models - SQLx-compatible structs for PostgreSQL tables

mod invite_stats;
mod usage_record;

pub use invite_stats::InviteStatsModel;
pub use usage_record::UsageRecordModel;

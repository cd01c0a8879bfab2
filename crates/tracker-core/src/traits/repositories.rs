//! Repository traits (ports) - define the interface for ledger storage
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Every implementation must enforce the
//! compound keys itself: at most one open usage record per
//! (community, user), one stats row per (community, inviter), and
//! version-checked stats updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{InviteStats, NewUsageRecord, UsageRecord};
use crate::error::DomainError;
use crate::value_objects::{InviterKey, Snowflake};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Ledger Repository
// ============================================================================

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    // --- usage_records -------------------------------------------------------

    /// Find the open usage record for a user in a community
    async fn find_open_usage(
        &self,
        community_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<UsageRecord>>;

    /// Open usage records credited to an inviter
    async fn find_open_usage_by_inviter(
        &self,
        community_id: Snowflake,
        inviter: InviterKey,
    ) -> RepoResult<Vec<UsageRecord>>;

    /// Insert a new open usage record.
    ///
    /// Fails with `ConflictingWrite` if the user already has an open record.
    async fn insert_usage(&self, record: &NewUsageRecord) -> RepoResult<UsageRecord>;

    /// Close an open usage record.
    ///
    /// Returns the closed record, or `None` if it was already closed.
    async fn close_usage(&self, id: i64, left_at: DateTime<Utc>) -> RepoResult<Option<UsageRecord>>;

    // --- invite_stats --------------------------------------------------------

    /// Find the stats row for an inviter
    async fn find_stats(
        &self,
        community_id: Snowflake,
        inviter: InviterKey,
    ) -> RepoResult<Option<InviteStats>>;

    /// Write a stats row with compare-and-swap on `version`.
    ///
    /// `expected_version = None` inserts a new row; `Some(v)` updates the row
    /// only if its stored version is still `v`. Either way a lost race is a
    /// `ConflictingWrite`. Returns the stored row with its new version.
    async fn save_stats(
        &self,
        stats: &InviteStats,
        expected_version: Option<i64>,
    ) -> RepoResult<InviteStats>;

    /// Top inviters by derived total, ties broken by earliest creation.
    /// The reserved vanity key is excluded.
    async fn leaderboard(&self, community_id: Snowflake, limit: i64) -> RepoResult<Vec<InviteStats>>;

    /// Zero counters for one inviter, or for every inviter when `inviter`
    /// is None. Rows are kept. Returns the number of rows reset.
    async fn reset_stats(
        &self,
        community_id: Snowflake,
        inviter: Option<InviterKey>,
    ) -> RepoResult<u64>;
}

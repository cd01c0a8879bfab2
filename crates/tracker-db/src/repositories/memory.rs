//! In-memory implementation of LedgerRepository
//!
//! Same keys and compare-and-swap rules as the PostgreSQL ledger, backed by a
//! single `parking_lot::Mutex`. Used by tests and by `LEDGER_BACKEND=memory`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::instrument;

use tracker_core::entities::{leaderboard_order, InviteStats, NewUsageRecord, UsageRecord};
use tracker_core::traits::{LedgerRepository, RepoResult};
use tracker_core::value_objects::{InviterKey, Snowflake};

use super::error::{open_usage_exists, stale_stats};

#[derive(Default)]
struct LedgerTables {
    next_usage_id: i64,
    usage: Vec<UsageRecord>,
    stats: HashMap<(Snowflake, InviterKey), InviteStats>,
}

/// In-memory ledger
#[derive(Default)]
pub struct MemoryLedgerRepository {
    tables: Mutex<LedgerTables>,
}

impl MemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every usage record ever stored for a community, oldest first
    pub fn usage_history(&self, community_id: Snowflake) -> Vec<UsageRecord> {
        self.tables
            .lock()
            .usage
            .iter()
            .filter(|record| record.community_id == community_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LedgerRepository for MemoryLedgerRepository {
    #[instrument(skip(self))]
    async fn find_open_usage(
        &self,
        community_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<UsageRecord>> {
        Ok(self
            .tables
            .lock()
            .usage
            .iter()
            .find(|r| r.community_id == community_id && r.user_id == user_id && r.is_open())
            .cloned())
    }

    #[instrument(skip(self))]
    async fn find_open_usage_by_inviter(
        &self,
        community_id: Snowflake,
        inviter: InviterKey,
    ) -> RepoResult<Vec<UsageRecord>> {
        Ok(self
            .tables
            .lock()
            .usage
            .iter()
            .filter(|r| r.community_id == community_id && r.inviter == Some(inviter) && r.is_open())
            .cloned()
            .collect())
    }

    #[instrument(skip(self, record), fields(community_id = %record.community_id, user_id = %record.user_id))]
    async fn insert_usage(&self, record: &NewUsageRecord) -> RepoResult<UsageRecord> {
        let mut tables = self.tables.lock();

        let already_open = tables.usage.iter().any(|r| {
            r.community_id == record.community_id && r.user_id == record.user_id && r.is_open()
        });
        if already_open {
            return Err(open_usage_exists(record.community_id, record.user_id));
        }

        tables.next_usage_id += 1;
        let stored = record.clone().into_record(tables.next_usage_id);
        tables.usage.push(stored.clone());
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn close_usage(&self, id: i64, left_at: DateTime<Utc>) -> RepoResult<Option<UsageRecord>> {
        let mut tables = self.tables.lock();
        Ok(tables
            .usage
            .iter_mut()
            .find(|r| r.id == id && r.is_open())
            .map(|r| {
                r.left_at = Some(left_at);
                r.clone()
            }))
    }

    #[instrument(skip(self))]
    async fn find_stats(
        &self,
        community_id: Snowflake,
        inviter: InviterKey,
    ) -> RepoResult<Option<InviteStats>> {
        Ok(self.tables.lock().stats.get(&(community_id, inviter)).cloned())
    }

    #[instrument(skip(self, stats), fields(community_id = %stats.community_id, inviter = %stats.inviter))]
    async fn save_stats(
        &self,
        stats: &InviteStats,
        expected_version: Option<i64>,
    ) -> RepoResult<InviteStats> {
        let key = (stats.community_id, stats.inviter);
        let mut tables = self.tables.lock();

        let stored_version = tables.stats.get(&key).map(|row| row.version);
        if stored_version != expected_version {
            return Err(stale_stats(stats.community_id, stats.inviter));
        }

        let created_at = tables
            .stats
            .get(&key)
            .map_or(stats.created_at, |row| row.created_at);

        let row = InviteStats {
            version: expected_version.map_or(1, |v| v + 1),
            created_at,
            ..stats.clone()
        };
        tables.stats.insert(key, row.clone());
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn leaderboard(&self, community_id: Snowflake, limit: i64) -> RepoResult<Vec<InviteStats>> {
        let tables = self.tables.lock();
        let mut rows: Vec<InviteStats> = tables
            .stats
            .values()
            .filter(|row| row.community_id == community_id && !row.inviter.is_vanity())
            .cloned()
            .collect();
        drop(tables);

        rows.sort_by(leaderboard_order);
        rows.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn reset_stats(
        &self,
        community_id: Snowflake,
        inviter: Option<InviterKey>,
    ) -> RepoResult<u64> {
        let mut tables = self.tables.lock();
        let mut rows = 0;
        for row in tables.stats.values_mut() {
            if row.community_id == community_id && inviter.map_or(true, |key| key == row.inviter) {
                row.reset();
                row.version += 1;
                rows += 1;
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::entities::{Attribution, StatsDelta, UnknownReason};

    fn community() -> Snowflake {
        Snowflake::new(100)
    }

    fn join(user: i64, inviter: i64) -> NewUsageRecord {
        let attribution = Attribution::Normal {
            code: "abc".to_string(),
            inviter_id: Some(Snowflake::new(inviter)),
            ambiguous: false,
        };
        NewUsageRecord::from_attribution(community(), Snowflake::new(user), &attribution, Utc::now(), Utc::now())
    }

    #[tokio::test]
    async fn test_one_open_usage_per_member() {
        let repo = MemoryLedgerRepository::new();
        let first = repo.insert_usage(&join(1, 9)).await.unwrap();

        let err = repo.insert_usage(&join(1, 9)).await.unwrap_err();
        assert!(err.is_conflict());

        repo.close_usage(first.id, Utc::now()).await.unwrap().unwrap();
        let second = repo.insert_usage(&join(1, 9)).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(repo.usage_history(community()).len(), 2);
    }

    #[tokio::test]
    async fn test_close_usage_twice_is_none() {
        let repo = MemoryLedgerRepository::new();
        let record = repo.insert_usage(&join(1, 9)).await.unwrap();

        assert!(repo.close_usage(record.id, Utc::now()).await.unwrap().is_some());
        assert!(repo.close_usage(record.id, Utc::now()).await.unwrap().is_none());
        assert!(repo.find_open_usage(community(), Snowflake::new(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_usage_by_inviter() {
        let repo = MemoryLedgerRepository::new();
        repo.insert_usage(&join(1, 9)).await.unwrap();
        repo.insert_usage(&join(2, 9)).await.unwrap();
        repo.insert_usage(&join(3, 8)).await.unwrap();
        let unknown = NewUsageRecord::from_attribution(
            community(),
            Snowflake::new(4),
            &Attribution::unknown(UnknownReason::NoCandidate),
            Utc::now(),
            Utc::now(),
        );
        repo.insert_usage(&unknown).await.unwrap();

        let invited = repo
            .find_open_usage_by_inviter(community(), InviterKey::User(Snowflake::new(9)))
            .await
            .unwrap();
        assert_eq!(invited.len(), 2);
    }

    #[tokio::test]
    async fn test_save_stats_compare_and_swap() {
        let repo = MemoryLedgerRepository::new();
        let key = InviterKey::User(Snowflake::new(9));

        let mut stats = InviteStats::new(community(), key);
        stats.apply(StatsDelta::join(false)).unwrap();
        let stored = repo.save_stats(&stats, None).await.unwrap();
        assert_eq!(stored.version, 1);

        // Second insert loses
        assert!(repo.save_stats(&stats, None).await.unwrap_err().is_conflict());

        let mut next = stored.clone();
        next.apply(StatsDelta::join(false)).unwrap();
        let stored = repo.save_stats(&next, Some(1)).await.unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.regular, 2);

        // Stale version loses
        assert!(repo.save_stats(&next, Some(1)).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_leaderboard_order_and_vanity_exclusion() {
        let repo = MemoryLedgerRepository::new();
        for (inviter, regular) in [(1, 3), (2, 5), (3, 3)] {
            let mut stats = InviteStats::new(community(), InviterKey::User(Snowflake::new(inviter)));
            stats.regular = regular;
            repo.save_stats(&stats, None).await.unwrap();
        }
        let mut vanity = InviteStats::new(community(), InviterKey::Vanity);
        vanity.regular = 50;
        repo.save_stats(&vanity, None).await.unwrap();

        let board = repo.leaderboard(community(), 10).await.unwrap();
        let ids: Vec<i64> = board.iter().map(|s| s.inviter.storage_id()).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let board = repo.leaderboard(community(), 1).await.unwrap();
        assert_eq!(board.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_stats_keeps_rows() {
        let repo = MemoryLedgerRepository::new();
        for inviter in [1, 2] {
            let mut stats = InviteStats::new(community(), InviterKey::User(Snowflake::new(inviter)));
            stats.regular = 4;
            stats.bonus = -2;
            repo.save_stats(&stats, None).await.unwrap();
        }

        let one = InviterKey::User(Snowflake::new(1));
        assert_eq!(repo.reset_stats(community(), Some(one)).await.unwrap(), 1);
        let row = repo.find_stats(community(), one).await.unwrap().unwrap();
        assert_eq!(row.total(), 0);
        assert_eq!(row.version, 2);

        assert_eq!(repo.reset_stats(community(), None).await.unwrap(), 2);
        assert_eq!(repo.leaderboard(community(), 10).await.unwrap().len(), 2);
    }
}

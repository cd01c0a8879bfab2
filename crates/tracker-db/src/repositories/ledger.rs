//! PostgreSQL implementation of LedgerRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use tracker_core::entities::{InviteStats, NewUsageRecord, UsageRecord};
use tracker_core::traits::{LedgerRepository, RepoResult};
use tracker_core::value_objects::{InviterKey, Snowflake};

use crate::mappers::UsageRecordInsert;
use crate::models::{InviteStatsModel, UsageRecordModel};

use super::error::{map_db_error, map_unique_violation, open_usage_exists, stale_stats};

const USAGE_COLUMNS: &str = "id, community_id, user_id, inviter_id, invite_code, attribution_kind, \
     ambiguous, unknown_reason, fake, joined_at, left_at, account_age_days";

const STATS_COLUMNS: &str =
    "community_id, inviter_id, regular, bonus, leaves, fake, version, created_at, updated_at";

/// PostgreSQL implementation of LedgerRepository
#[derive(Clone)]
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    /// Create a new PgLedgerRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool (health checks)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    #[instrument(skip(self))]
    async fn find_open_usage(
        &self,
        community_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<UsageRecord>> {
        let result = sqlx::query_as::<_, UsageRecordModel>(&format!(
            r#"
            SELECT {USAGE_COLUMNS}
            FROM usage_records
            WHERE community_id = $1 AND user_id = $2 AND left_at IS NULL
            "#
        ))
        .bind(community_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(UsageRecord::from))
    }

    #[instrument(skip(self))]
    async fn find_open_usage_by_inviter(
        &self,
        community_id: Snowflake,
        inviter: InviterKey,
    ) -> RepoResult<Vec<UsageRecord>> {
        let results = sqlx::query_as::<_, UsageRecordModel>(&format!(
            r#"
            SELECT {USAGE_COLUMNS}
            FROM usage_records
            WHERE community_id = $1 AND inviter_id = $2 AND left_at IS NULL
            ORDER BY joined_at ASC, id ASC
            "#
        ))
        .bind(community_id.into_inner())
        .bind(inviter.storage_id())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(UsageRecord::from).collect())
    }

    #[instrument(skip(self, record), fields(community_id = %record.community_id, user_id = %record.user_id))]
    async fn insert_usage(&self, record: &NewUsageRecord) -> RepoResult<UsageRecord> {
        let insert = UsageRecordInsert::new(record);

        let row = sqlx::query_as::<_, UsageRecordModel>(&format!(
            r#"
            INSERT INTO usage_records (community_id, user_id, inviter_id, invite_code,
                                       attribution_kind, ambiguous, unknown_reason, fake,
                                       joined_at, account_age_days)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USAGE_COLUMNS}
            "#
        ))
        .bind(insert.community_id)
        .bind(insert.user_id)
        .bind(insert.inviter_id)
        .bind(insert.invite_code)
        .bind(insert.attribution_kind)
        .bind(insert.ambiguous)
        .bind(insert.unknown_reason)
        .bind(insert.fake)
        .bind(insert.joined_at)
        .bind(insert.account_age_days)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || open_usage_exists(record.community_id, record.user_id))
        })?;

        Ok(UsageRecord::from(row))
    }

    #[instrument(skip(self))]
    async fn close_usage(&self, id: i64, left_at: DateTime<Utc>) -> RepoResult<Option<UsageRecord>> {
        let result = sqlx::query_as::<_, UsageRecordModel>(&format!(
            r#"
            UPDATE usage_records
            SET left_at = $2
            WHERE id = $1 AND left_at IS NULL
            RETURNING {USAGE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(left_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(UsageRecord::from))
    }

    #[instrument(skip(self))]
    async fn find_stats(
        &self,
        community_id: Snowflake,
        inviter: InviterKey,
    ) -> RepoResult<Option<InviteStats>> {
        let result = sqlx::query_as::<_, InviteStatsModel>(&format!(
            r#"
            SELECT {STATS_COLUMNS}
            FROM invite_stats
            WHERE community_id = $1 AND inviter_id = $2
            "#
        ))
        .bind(community_id.into_inner())
        .bind(inviter.storage_id())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(InviteStats::from))
    }

    #[instrument(skip(self, stats), fields(community_id = %stats.community_id, inviter = %stats.inviter))]
    async fn save_stats(
        &self,
        stats: &InviteStats,
        expected_version: Option<i64>,
    ) -> RepoResult<InviteStats> {
        let community_id = stats.community_id;
        let inviter = stats.inviter;

        let row = match expected_version {
            None => sqlx::query_as::<_, InviteStatsModel>(&format!(
                r#"
                INSERT INTO invite_stats (community_id, inviter_id, regular, bonus, leaves, fake,
                                          version, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, 1, $7, $8)
                RETURNING {STATS_COLUMNS}
                "#
            ))
            .bind(community_id.into_inner())
            .bind(inviter.storage_id())
            .bind(stats.regular)
            .bind(stats.bonus)
            .bind(stats.leaves)
            .bind(stats.fake)
            .bind(stats.created_at)
            .bind(stats.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, || stale_stats(community_id, inviter)))?,

            Some(version) => sqlx::query_as::<_, InviteStatsModel>(&format!(
                r#"
                UPDATE invite_stats
                SET regular = $3, bonus = $4, leaves = $5, fake = $6,
                    version = version + 1, updated_at = $7
                WHERE community_id = $1 AND inviter_id = $2 AND version = $8
                RETURNING {STATS_COLUMNS}
                "#
            ))
            .bind(community_id.into_inner())
            .bind(inviter.storage_id())
            .bind(stats.regular)
            .bind(stats.bonus)
            .bind(stats.leaves)
            .bind(stats.fake)
            .bind(stats.updated_at)
            .bind(version)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| stale_stats(community_id, inviter))?,
        };

        Ok(InviteStats::from(row))
    }

    #[instrument(skip(self))]
    async fn leaderboard(&self, community_id: Snowflake, limit: i64) -> RepoResult<Vec<InviteStats>> {
        let results = sqlx::query_as::<_, InviteStatsModel>(&format!(
            r#"
            SELECT {STATS_COLUMNS}
            FROM invite_stats
            WHERE community_id = $1 AND inviter_id <> $3
            ORDER BY (regular + bonus - leaves - fake) DESC, created_at ASC, inviter_id ASC
            LIMIT $2
            "#
        ))
        .bind(community_id.into_inner())
        .bind(limit)
        .bind(InviterKey::VANITY_STORAGE_ID)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(InviteStats::from).collect())
    }

    #[instrument(skip(self))]
    async fn reset_stats(
        &self,
        community_id: Snowflake,
        inviter: Option<InviterKey>,
    ) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE invite_stats
            SET regular = 0, bonus = 0, leaves = 0, fake = 0,
                version = version + 1, updated_at = NOW()
            WHERE community_id = $1 AND ($2::BIGINT IS NULL OR inviter_id = $2)
            "#,
        )
        .bind(community_id.into_inner())
        .bind(inviter.map(|key| key.storage_id()))
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}

//! Ledger service
//!
//! Durable bookkeeping: usage records per join and aggregated counters per
//! inviter. Counter writes are compare-and-swap on `version`; a lost race is
//! retried once against a fresh read.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use tracker_core::{
    Attribution, DomainError, InviteStats, InviterKey, LeaderboardEntry, NewUsageRecord,
    Snowflake, StatsDelta, StatsSummary, UsageRecord,
};

use super::context::TrackerContext;
use super::error::{ServiceError, ServiceResult};

/// Largest leaderboard page
pub const MAX_LEADERBOARD_LIMIT: i64 = 100;

/// Leaderboard page size when the caller does not ask for one
pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;

/// Ledger service
pub struct LedgerService<'a> {
    ctx: &'a TrackerContext,
}

impl<'a> LedgerService<'a> {
    /// Create a new LedgerService
    pub fn new(ctx: &'a TrackerContext) -> Self {
        Self { ctx }
    }

    /// Record a join.
    ///
    /// A member who is still on the books from an earlier join left without
    /// us hearing about it: that record is closed at the re-join time and
    /// counts as a leave for whoever it credited. If another writer opened a
    /// record in between, the close and insert are retried once.
    #[instrument(skip(self, attribution), fields(kind = %attribution.kind()))]
    pub async fn record_join(
        &self,
        community_id: Snowflake,
        user_id: Snowflake,
        attribution: &Attribution,
        joined_at: DateTime<Utc>,
        account_created_at: DateTime<Utc>,
    ) -> ServiceResult<UsageRecord> {
        let repo = self.ctx.ledger_repo();

        self.close_prior(community_id, user_id, joined_at).await?;

        let fake = self.ctx.fake_policy().is_fake(joined_at - account_created_at);
        let new = NewUsageRecord::from_attribution(
            community_id,
            user_id,
            attribution,
            joined_at,
            account_created_at,
        )
        .with_fake(fake);

        let record = match repo.insert_usage(&new).await {
            Err(e) if e.is_conflict() => {
                warn!(
                    community_id = %community_id,
                    user_id = %user_id,
                    "Open usage record appeared concurrently, retrying"
                );
                self.close_prior(community_id, user_id, joined_at).await?;
                repo.insert_usage(&new).await.map_err(|e| {
                    if e.is_conflict() {
                        ServiceError::internal(format!(
                            "open usage record for user {user_id} in community {community_id} \
                             kept reappearing under concurrent writes"
                        ))
                    } else {
                        e.into()
                    }
                })?
            }
            result => result?,
        };

        if let (true, Some(inviter)) = (record.credits_inviter(), record.inviter) {
            self.apply_delta(community_id, inviter, StatsDelta::join(record.fake))
                .await?;
        }

        debug!(
            community_id = %community_id,
            user_id = %user_id,
            record_id = record.id,
            fake = record.fake,
            "Join recorded"
        );

        Ok(record)
    }

    /// Record a leave. Returns the closed record, or None when the member
    /// had no open record.
    #[instrument(skip(self))]
    pub async fn record_leave(
        &self,
        community_id: Snowflake,
        user_id: Snowflake,
        left_at: DateTime<Utc>,
    ) -> ServiceResult<Option<UsageRecord>> {
        let repo = self.ctx.ledger_repo();

        let Some(open) = repo.find_open_usage(community_id, user_id).await? else {
            debug!(community_id = %community_id, user_id = %user_id, "Leave without open usage record");
            return Ok(None);
        };

        let Some(closed) = repo.close_usage(open.id, left_at).await? else {
            return Ok(None);
        };

        self.credit_leave(&closed).await?;
        Ok(Some(closed))
    }

    /// Add `delta` (positive or negative) bonus invites to an inviter
    #[instrument(skip(self))]
    pub async fn adjust_bonus(
        &self,
        community_id: Snowflake,
        inviter_id: Snowflake,
        delta: i64,
    ) -> ServiceResult<InviteStats> {
        if delta == 0 {
            return Err(ServiceError::validation("Bonus delta must not be zero"));
        }

        let stats = self
            .apply_delta(community_id, InviterKey::User(inviter_id), StatsDelta::bonus(delta))
            .await?;

        info!(
            community_id = %community_id,
            inviter_id = %inviter_id,
            delta,
            bonus = stats.bonus,
            "Bonus adjusted"
        );

        Ok(stats)
    }

    /// Counters for an inviter, zeroes if they never invited anyone
    #[instrument(skip(self))]
    pub async fn get_stats(
        &self,
        community_id: Snowflake,
        inviter_id: Snowflake,
    ) -> ServiceResult<StatsSummary> {
        let stats = self
            .ctx
            .ledger_repo()
            .find_stats(community_id, InviterKey::User(inviter_id))
            .await?;

        Ok(stats.map(|s| s.summary()).unwrap_or_default())
    }

    /// Top inviters, ranked from 1. `limit` is clamped to 1..=100.
    #[instrument(skip(self))]
    pub async fn get_leaderboard(
        &self,
        community_id: Snowflake,
        limit: i64,
    ) -> ServiceResult<Vec<LeaderboardEntry>> {
        let limit = limit.clamp(1, MAX_LEADERBOARD_LIMIT);
        let rows = self.ctx.ledger_repo().leaderboard(community_id, limit).await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.inviter.user_id().map(|id| (id, row.summary())))
            .enumerate()
            .map(|(i, (inviter_id, stats))| LeaderboardEntry {
                rank: i + 1,
                inviter_id,
                stats,
            })
            .collect())
    }

    /// Zero one inviter's counters
    #[instrument(skip(self))]
    pub async fn reset_user(&self, community_id: Snowflake, inviter_id: Snowflake) -> ServiceResult<u64> {
        let rows = self
            .ctx
            .ledger_repo()
            .reset_stats(community_id, Some(InviterKey::User(inviter_id)))
            .await?;

        info!(community_id = %community_id, inviter_id = %inviter_id, rows, "Inviter stats reset");
        Ok(rows)
    }

    /// Zero every inviter's counters in a community
    #[instrument(skip(self))]
    pub async fn reset_all(&self, community_id: Snowflake) -> ServiceResult<u64> {
        let rows = self.ctx.ledger_repo().reset_stats(community_id, None).await?;

        warn!(community_id = %community_id, rows, "All invite stats reset");
        Ok(rows)
    }

    /// Members currently in the community thanks to this inviter
    #[instrument(skip(self))]
    pub async fn invited_by(
        &self,
        community_id: Snowflake,
        inviter_id: Snowflake,
    ) -> ServiceResult<Vec<UsageRecord>> {
        Ok(self
            .ctx
            .ledger_repo()
            .find_open_usage_by_inviter(community_id, InviterKey::User(inviter_id))
            .await?)
    }

    /// The open usage record explaining how a member got in
    #[instrument(skip(self))]
    pub async fn open_usage(
        &self,
        community_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Option<UsageRecord>> {
        Ok(self.ctx.ledger_repo().find_open_usage(community_id, user_id).await?)
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Close the member's open record, if any, at `at`
    async fn close_prior(
        &self,
        community_id: Snowflake,
        user_id: Snowflake,
        at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        let repo = self.ctx.ledger_repo();
        let Some(prior) = repo.find_open_usage(community_id, user_id).await? else {
            return Ok(());
        };

        if let Some(closed) = repo.close_usage(prior.id, at).await? {
            info!(
                community_id = %community_id,
                user_id = %user_id,
                prior_record = closed.id,
                "Closed open usage record on re-join"
            );
            self.credit_leave(&closed).await?;
        }
        Ok(())
    }

    async fn credit_leave(&self, closed: &UsageRecord) -> ServiceResult<()> {
        if let (true, Some(inviter)) = (closed.credits_inviter(), closed.inviter) {
            self.apply_delta(closed.community_id, inviter, StatsDelta::leave())
                .await?;
        }
        Ok(())
    }

    /// Read-modify-write one stats row, retrying once on a lost race
    async fn apply_delta(
        &self,
        community_id: Snowflake,
        inviter: InviterKey,
        delta: StatsDelta,
    ) -> ServiceResult<InviteStats> {
        match self.try_apply_delta(community_id, inviter, delta).await {
            Err(e) if e.is_conflict() => {
                warn!(
                    community_id = %community_id,
                    inviter = %inviter,
                    "Stats write lost a race, retrying"
                );
                self.try_apply_delta(community_id, inviter, delta)
                    .await
                    .map_err(|e| {
                        if e.is_conflict() {
                            ServiceError::internal(format!(
                                "stats for inviter {inviter} in community {community_id} \
                                 kept changing under concurrent writes"
                            ))
                        } else {
                            e.into()
                        }
                    })
            }
            result => Ok(result?),
        }
    }

    async fn try_apply_delta(
        &self,
        community_id: Snowflake,
        inviter: InviterKey,
        delta: StatsDelta,
    ) -> Result<InviteStats, DomainError> {
        let repo = self.ctx.ledger_repo();
        let current = repo.find_stats(community_id, inviter).await?;
        let expected_version = current.as_ref().map(|row| row.version);

        let mut stats = current.unwrap_or_else(|| InviteStats::new(community_id, inviter));
        stats.apply(delta)?;
        repo.save_stats(&stats, expected_version).await
    }
}

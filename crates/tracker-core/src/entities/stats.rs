//! Invite statistics - per (community, inviter) aggregate counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{InviterKey, Snowflake};

/// Aggregate row in the ledger
///
/// `version` is the compare-and-swap token: every successful write bumps it,
/// and a writer holding a stale version is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteStats {
    pub community_id: Snowflake,
    pub inviter: InviterKey,
    pub regular: i64,
    /// Admin corrections; may go negative
    pub bonus: i64,
    pub leaves: i64,
    pub fake: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InviteStats {
    /// Create an all-zero row
    pub fn new(community_id: Snowflake, inviter: InviterKey) -> Self {
        let now = Utc::now();
        Self {
            community_id,
            inviter,
            regular: 0,
            bonus: 0,
            leaves: 0,
            fake: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derived total, never stored
    #[inline]
    pub fn total(&self) -> i64 {
        self.regular
            .saturating_add(self.bonus)
            .saturating_sub(self.leaves)
            .saturating_sub(self.fake)
    }

    /// Apply a counter delta. Does not touch `version`.
    ///
    /// # Errors
    /// Returns `DomainError::ValidationError` when a counter or the derived
    /// total would overflow. The row is left unchanged.
    pub fn apply(&mut self, delta: StatsDelta) -> Result<(), DomainError> {
        let overflow = || DomainError::validation("invite counter out of range");

        let regular = self.regular.checked_add(delta.regular).ok_or_else(overflow)?;
        let bonus = self.bonus.checked_add(delta.bonus).ok_or_else(overflow)?;
        let leaves = self.leaves.checked_add(delta.leaves).ok_or_else(overflow)?;
        let fake = self.fake.checked_add(delta.fake).ok_or_else(overflow)?;
        regular
            .checked_add(bonus)
            .and_then(|t| t.checked_sub(leaves))
            .and_then(|t| t.checked_sub(fake))
            .ok_or_else(overflow)?;

        self.regular = regular;
        self.bonus = bonus;
        self.leaves = leaves;
        self.fake = fake;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Zero every counter, keeping the row and its creation time
    pub fn reset(&mut self) {
        self.regular = 0;
        self.bonus = 0;
        self.leaves = 0;
        self.fake = 0;
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            regular: self.regular,
            bonus: self.bonus,
            leaves: self.leaves,
            fake: self.fake,
            total: self.total(),
        }
    }
}

/// Change to apply to an `InviteStats` row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsDelta {
    pub regular: i64,
    pub bonus: i64,
    pub leaves: i64,
    pub fake: i64,
}

impl StatsDelta {
    /// One attributed join, optionally flagged fake
    pub fn join(fake: bool) -> Self {
        Self {
            regular: 1,
            fake: i64::from(fake),
            ..Self::default()
        }
    }

    /// One attributed departure
    pub fn leave() -> Self {
        Self {
            leaves: 1,
            ..Self::default()
        }
    }

    pub fn bonus(delta: i64) -> Self {
        Self {
            bonus: delta,
            ..Self::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Read model returned to callers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub regular: i64,
    pub bonus: i64,
    pub leaves: i64,
    pub fake: i64,
    pub total: i64,
}

/// Leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub inviter_id: Snowflake,
    pub stats: StatsSummary,
}

/// Leaderboard ordering: total descending, then oldest row first, then id
pub fn leaderboard_order(a: &InviteStats, b: &InviteStats) -> std::cmp::Ordering {
    b.total()
        .cmp(&a.total())
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.inviter.storage_id().cmp(&b.inviter.storage_id()))
}

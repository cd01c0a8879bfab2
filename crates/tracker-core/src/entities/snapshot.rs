//! Snapshot entities - the observed state of a community's invites

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// One invite as observed in a remote listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteSnapshot {
    pub code: String,
    pub uses: i32,
    /// 0 = unlimited
    pub max_uses: i32,
    /// None for system-generated invites
    pub inviter_id: Option<Snowflake>,
    pub created_at: DateTime<Utc>,
    /// 0 = never expires
    pub max_age_seconds: i32,
}

impl InviteSnapshot {
    /// Create a snapshot of an unlimited, never-expiring invite
    pub fn new(code: impl Into<String>, uses: i32, inviter_id: Option<Snowflake>) -> Self {
        Self {
            code: code.into(),
            uses,
            max_uses: 0,
            inviter_id,
            created_at: Utc::now(),
            max_age_seconds: 0,
        }
    }

    /// Set max uses
    pub fn with_max_uses(mut self, max_uses: i32) -> Self {
        self.max_uses = max_uses;
        self
    }

    /// Set max age
    pub fn with_max_age(mut self, max_age_seconds: i32) -> Self {
        self.max_age_seconds = max_age_seconds;
        self
    }

    /// Set creation time
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Whether the invite has a use limit
    #[inline]
    pub fn is_limited(&self) -> bool {
        self.max_uses > 0
    }

    /// Exactly one use left: the next join consumes the invite and the
    /// remote service deletes it.
    #[inline]
    pub fn is_on_last_use(&self) -> bool {
        self.is_limited() && self.uses == self.max_uses - 1
    }

    /// Expiry time (None if the invite never expires)
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        (self.max_age_seconds > 0)
            .then(|| self.created_at + Duration::seconds(i64::from(self.max_age_seconds)))
    }
}

/// Vanity URL usage counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VanitySnapshot {
    pub code: String,
    pub uses: i32,
}

impl VanitySnapshot {
    pub fn new(code: impl Into<String>, uses: i32) -> Self {
        Self {
            code: code.into(),
            uses,
        }
    }
}

/// Everything the tracker caches for one community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunitySnapshot {
    /// Invites in remote fetch order
    pub invites: Vec<InviteSnapshot>,
    /// Absent if the community has no vanity URL
    pub vanity: Option<VanitySnapshot>,
    /// None for a community that has never been observed
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CommunitySnapshot {
    /// Snapshot for a community that has never been observed
    pub fn empty() -> Self {
        Self {
            invites: Vec::new(),
            vanity: None,
            fetched_at: None,
        }
    }

    /// Freshly fetched snapshot
    pub fn fetched(invites: Vec<InviteSnapshot>, vanity: Option<VanitySnapshot>) -> Self {
        Self {
            invites,
            vanity,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn is_observed(&self) -> bool {
        self.fetched_at.is_some()
    }

    pub fn find(&self, code: &str) -> Option<&InviteSnapshot> {
        self.invites.iter().find(|invite| invite.code == code)
    }
}

impl Default for CommunitySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

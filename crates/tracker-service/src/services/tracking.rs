//! Per-community tracking status
//!
//! A community whose invite listing is forbidden stays `Disabled` until a
//! later fetch succeeds. Joins retry the fetch for a disabled community once the
//! retry interval has passed since the last attempt. Transitions are
//! reported once so callers can log and emit an event exactly at the edge.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracker_core::Snowflake;

/// Default wait between fetch attempts for a disabled community
pub const DEFAULT_PERMISSION_RETRY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    #[default]
    Active,
    Disabled,
}

/// Disabled communities keyed by id, with the time of their last fetch
/// attempt. Absent means `Active`.
#[derive(Debug)]
pub struct TrackingRegistry {
    disabled: DashMap<Snowflake, Instant>,
    retry_after: Duration,
}

impl TrackingRegistry {
    pub fn new() -> Self {
        Self::with_retry_after(DEFAULT_PERMISSION_RETRY)
    }

    pub fn with_retry_after(retry_after: Duration) -> Self {
        Self {
            disabled: DashMap::new(),
            retry_after,
        }
    }

    pub fn retry_after(&self) -> Duration {
        self.retry_after
    }

    pub fn status(&self, community_id: Snowflake) -> TrackingStatus {
        if self.disabled.contains_key(&community_id) {
            TrackingStatus::Disabled
        } else {
            TrackingStatus::Active
        }
    }

    pub fn is_disabled(&self, community_id: Snowflake) -> bool {
        self.status(community_id) == TrackingStatus::Disabled
    }

    /// Whether a join should fetch the listing now.
    ///
    /// Always true for an active community. For a disabled one, true once
    /// the retry interval has passed, and the attempt time is reset so
    /// concurrent callers do not all fetch.
    pub fn should_refetch(&self, community_id: Snowflake) -> bool {
        match self.disabled.get_mut(&community_id) {
            None => true,
            Some(mut last_attempt) => {
                if last_attempt.elapsed() >= self.retry_after {
                    *last_attempt = Instant::now();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Mark a community disabled. Returns true on the Active -> Disabled edge.
    pub fn disable(&self, community_id: Snowflake) -> bool {
        self.disabled.insert(community_id, Instant::now()).is_none()
    }

    /// Mark a community active again. Returns true on the Disabled -> Active edge.
    pub fn enable(&self, community_id: Snowflake) -> bool {
        self.disabled.remove(&community_id).is_some()
    }

    /// Forget a community entirely
    pub fn remove(&self, community_id: Snowflake) {
        self.disabled.remove(&community_id);
    }

    /// Number of communities currently disabled
    pub fn disabled_count(&self) -> usize {
        self.disabled.len()
    }
}

impl Default for TrackingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

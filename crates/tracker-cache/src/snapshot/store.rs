//! Snapshot store - last observed invite state per community
//!
//! Pure cache: everything in here can be rebuilt by fetching again, so it
//! lives in process memory only. Entries are replaced wholesale after a
//! complete fetch and never merged.

use std::sync::Arc;

use dashmap::DashMap;
use tracker_core::entities::CommunitySnapshot;
use tracker_core::value_objects::Snowflake;

/// Concurrent map of community id to its last snapshot
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: DashMap<Snowflake, CommunitySnapshot>,
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last snapshot, or an empty one for a community never observed
    pub fn get(&self, community_id: Snowflake) -> CommunitySnapshot {
        self.snapshots
            .get(&community_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Overwrite the snapshot for a community
    pub fn replace(&self, community_id: Snowflake, snapshot: CommunitySnapshot) {
        tracing::trace!(
            community_id = %community_id,
            invites = snapshot.invites.len(),
            vanity = snapshot.vanity.is_some(),
            "Snapshot replaced"
        );
        self.snapshots.insert(community_id, snapshot);
    }

    /// Whether the community has been observed at least once
    pub fn contains(&self, community_id: Snowflake) -> bool {
        self.snapshots.contains_key(&community_id)
    }

    /// Drop a community (bot removed from it). Returns the old snapshot.
    pub fn evict(&self, community_id: Snowflake) -> Option<CommunitySnapshot> {
        self.snapshots.remove(&community_id).map(|(_, snapshot)| snapshot)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Store handle shared between services
pub type SharedSnapshotStore = Arc<SnapshotStore>;

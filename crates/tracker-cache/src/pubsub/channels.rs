//! Pub/Sub channel definitions.
//!
//! Defines the channel naming conventions for Redis Pub/Sub.

use tracker_core::Snowflake;

/// Channel prefix for per-community tracker events
pub const COMMUNITY_CHANNEL_PREFIX: &str = "tracker:community:";
/// Channel carrying every tracker event
pub const BROADCAST_CHANNEL: &str = "tracker:events";

/// Pub/Sub channel types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PubSubChannel {
    /// Events for one community
    Community(Snowflake),
    /// Every event
    Broadcast,
}

impl PubSubChannel {
    #[must_use]
    pub fn community(community_id: Snowflake) -> Self {
        Self::Community(community_id)
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Community(id) => format!("{COMMUNITY_CHANNEL_PREFIX}{id}"),
            Self::Broadcast => BROADCAST_CHANNEL.to_string(),
        }
    }

    /// Parse a channel name back to a `PubSubChannel`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        if name == BROADCAST_CHANNEL {
            return Some(Self::Broadcast);
        }
        name.strip_prefix(COMMUNITY_CHANNEL_PREFIX)
            .and_then(|id| id.parse::<i64>().ok())
            .map(|id| Self::Community(Snowflake::from(id)))
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

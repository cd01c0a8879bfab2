//! # tracker-cache
//!
//! Caching layer: the in-memory invite snapshot store and the Redis
//! pub/sub publisher for domain events.
//!
//! ## Features
//!
//! - **Snapshot Store**: last observed invite listing per community (`dashmap`)
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Pub/Sub**: Domain events published per community as JSON
//!
//! ## Example
//!
//! ```ignore
//! use tracker_cache::{Publisher, RedisPool, RedisPoolConfig, SnapshotStore};
//!
//! let store = Arc::new(SnapshotStore::new());
//! let snapshot = store.get(community_id);
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let publisher = Publisher::new(pool);
//! publisher.publish_domain_event(&event).await?;
//! ```

pub mod pool;
pub mod pubsub;
pub mod snapshot;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export pubsub types
pub use pubsub::{
    PubSubChannel, PubSubEvent, Publisher, BROADCAST_CHANNEL, COMMUNITY_CHANNEL_PREFIX,
};

// Re-export snapshot types
pub use snapshot::{SharedSnapshotStore, SnapshotStore};

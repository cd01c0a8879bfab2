//! Service context - dependency container for services
//!
//! Holds the ledger, the remote fetcher, the event sink and the shared
//! in-memory state (snapshot store, serializer, tracking status).
//! Cloning is cheap: every field is an `Arc` or a pool handle.

use std::sync::Arc;
use std::time::Duration;

use tracker_cache::{RedisPool, SnapshotStore};
use tracker_common::Environment;
use tracker_core::traits::{EventSink, FakeAccountPolicy, LedgerRepository, NeverFake, SnapshotFetcher};
use tracker_db::PgPool;

use super::error::{ServiceError, ServiceResult};
use super::serializer::CommunitySerializer;
use super::tracking::{TrackingRegistry, DEFAULT_PERMISSION_RETRY};

/// Service context containing all dependencies
///
/// Passed by reference to the services and cloned into serialized tasks.
#[derive(Clone)]
pub struct TrackerContext {
    // Ports
    ledger_repo: Arc<dyn LedgerRepository>,
    fetcher: Arc<dyn SnapshotFetcher>,
    event_sink: Arc<dyn EventSink>,
    fake_policy: Arc<dyn FakeAccountPolicy>,

    // Shared state
    snapshots: Arc<SnapshotStore>,
    serializer: Arc<CommunitySerializer>,
    tracking: Arc<TrackingRegistry>,

    environment: Environment,

    // Health checks only
    pool: Option<PgPool>,
    redis_pool: Option<RedisPool>,
}

impl TrackerContext {
    /// Start building a context
    pub fn builder() -> TrackerContextBuilder {
        TrackerContextBuilder::new()
    }

    // === Ports ===

    /// Get the ledger repository
    pub fn ledger_repo(&self) -> &dyn LedgerRepository {
        self.ledger_repo.as_ref()
    }

    /// Get the remote invite fetcher
    pub fn fetcher(&self) -> &dyn SnapshotFetcher {
        self.fetcher.as_ref()
    }

    /// Get the event sink
    pub fn event_sink(&self) -> &dyn EventSink {
        self.event_sink.as_ref()
    }

    /// Get the fake-account policy
    pub fn fake_policy(&self) -> &dyn FakeAccountPolicy {
        self.fake_policy.as_ref()
    }

    // === Shared state ===

    pub fn snapshots(&self) -> &SnapshotStore {
        self.snapshots.as_ref()
    }

    pub fn serializer(&self) -> &CommunitySerializer {
        self.serializer.as_ref()
    }

    pub fn tracking(&self) -> &TrackingRegistry {
        self.tracking.as_ref()
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    // === Pools ===

    /// PostgreSQL pool, when the ledger is database-backed
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Redis pool, when events are published through Redis
    pub fn redis_pool(&self) -> Option<&RedisPool> {
        self.redis_pool.as_ref()
    }
}

impl std::fmt::Debug for TrackerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerContext")
            .field("environment", &self.environment)
            .field("snapshots", &self.snapshots.len())
            .field("active_queues", &self.serializer.active_communities())
            .field("pool", &self.pool.is_some())
            .field("redis_pool", &self.redis_pool.is_some())
            .finish()
    }
}

/// Builder for creating TrackerContext
///
/// The ledger, fetcher and event sink are required. Everything else has a
/// default: `NeverFake`, fresh in-memory state, a one-minute permission
/// retry and the development environment.
pub struct TrackerContextBuilder {
    ledger_repo: Option<Arc<dyn LedgerRepository>>,
    fetcher: Option<Arc<dyn SnapshotFetcher>>,
    event_sink: Option<Arc<dyn EventSink>>,
    fake_policy: Option<Arc<dyn FakeAccountPolicy>>,
    snapshots: Option<Arc<SnapshotStore>>,
    permission_retry: Duration,
    environment: Environment,
    pool: Option<PgPool>,
    redis_pool: Option<RedisPool>,
}

impl TrackerContextBuilder {
    pub fn new() -> Self {
        Self {
            ledger_repo: None,
            fetcher: None,
            event_sink: None,
            fake_policy: None,
            snapshots: None,
            permission_retry: DEFAULT_PERMISSION_RETRY,
            environment: Environment::default(),
            pool: None,
            redis_pool: None,
        }
    }

    pub fn ledger_repo(mut self, repo: Arc<dyn LedgerRepository>) -> Self {
        self.ledger_repo = Some(repo);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn SnapshotFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn fake_policy(mut self, policy: Arc<dyn FakeAccountPolicy>) -> Self {
        self.fake_policy = Some(policy);
        self
    }

    pub fn snapshots(mut self, store: Arc<SnapshotStore>) -> Self {
        self.snapshots = Some(store);
        self
    }

    /// How long joins wait before probing a disabled community again
    pub fn permission_retry(mut self, retry_after: Duration) -> Self {
        self.permission_retry = retry_after;
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn redis_pool(mut self, redis_pool: RedisPool) -> Self {
        self.redis_pool = Some(redis_pool);
        self
    }

    /// Build the TrackerContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<TrackerContext> {
        Ok(TrackerContext {
            ledger_repo: self
                .ledger_repo
                .ok_or_else(|| ServiceError::validation("ledger_repo is required"))?,
            fetcher: self
                .fetcher
                .ok_or_else(|| ServiceError::validation("fetcher is required"))?,
            event_sink: self
                .event_sink
                .ok_or_else(|| ServiceError::validation("event_sink is required"))?,
            fake_policy: self.fake_policy.unwrap_or_else(|| Arc::new(NeverFake)),
            snapshots: self.snapshots.unwrap_or_default(),
            serializer: Arc::new(CommunitySerializer::new()),
            tracking: Arc::new(TrackingRegistry::with_retry_after(self.permission_retry)),
            environment: self.environment,
            pool: self.pool,
            redis_pool: self.redis_pool,
        })
    }
}

impl Default for TrackerContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Shared fixtures for service tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use tracker_core::traits::{LedgerRepository, RepoResult};
use tracker_core::{
    DomainError, FetchError, InviteSnapshot, InviteStats, InviterKey, NewUsageRecord,
    SnapshotFetcher, Snowflake, UsageRecord, VanitySnapshot,
};
use tracker_db::MemoryLedgerRepository;

use super::context::{TrackerContext, TrackerContextBuilder};
use super::events::BroadcastEventSink;

#[derive(Default)]
struct Listing {
    invites: Vec<InviteSnapshot>,
    vanity: Option<VanitySnapshot>,
    failure: Option<FetchError>,
}

/// Fetcher whose answers are set by the test
#[derive(Default)]
pub struct ScriptedFetcher {
    listings: Mutex<HashMap<Snowflake, Listing>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn set_invites(&self, community_id: Snowflake, invites: Vec<InviteSnapshot>) {
        self.listings.lock().entry(community_id).or_default().invites = invites;
    }

    pub fn set_vanity(&self, community_id: Snowflake, vanity: Option<VanitySnapshot>) {
        self.listings.lock().entry(community_id).or_default().vanity = vanity;
    }

    pub fn fail(&self, community_id: Snowflake, error: FetchError) {
        self.listings.lock().entry(community_id).or_default().failure = Some(error);
    }

    pub fn recover(&self, community_id: Snowflake) {
        self.listings.lock().entry(community_id).or_default().failure = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFetcher for ScriptedFetcher {
    async fn fetch_invites(&self, community_id: Snowflake) -> Result<Vec<InviteSnapshot>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let listings = self.listings.lock();
        let listing = listings.get(&community_id);
        match listing.and_then(|l| l.failure.clone()) {
            Some(error) => Err(error),
            None => Ok(listing.map(|l| l.invites.clone()).unwrap_or_default()),
        }
    }

    async fn fetch_vanity(&self, community_id: Snowflake) -> Result<Option<VanitySnapshot>, FetchError> {
        Ok(self
            .listings
            .lock()
            .get(&community_id)
            .and_then(|l| l.vanity.clone()))
    }
}

/// Ledger that loses writes to a simulated concurrent writer
pub struct ConflictingLedger {
    inner: MemoryLedgerRepository,
    stats_conflicts: AtomicUsize,
    insert_conflicts: AtomicUsize,
}

impl ConflictingLedger {
    /// The next `conflicts` stats writes fail
    pub fn new(conflicts: usize) -> Self {
        Self {
            inner: MemoryLedgerRepository::new(),
            stats_conflicts: AtomicUsize::new(conflicts),
            insert_conflicts: AtomicUsize::new(0),
        }
    }

    /// The next `conflicts` usage inserts find that another writer has just
    /// opened a record for the same member
    pub fn with_insert_conflicts(conflicts: usize) -> Self {
        Self {
            inner: MemoryLedgerRepository::new(),
            stats_conflicts: AtomicUsize::new(0),
            insert_conflicts: AtomicUsize::new(conflicts),
        }
    }

    pub fn inner(&self) -> &MemoryLedgerRepository {
        &self.inner
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl LedgerRepository for ConflictingLedger {
    async fn find_open_usage(&self, c: Snowflake, u: Snowflake) -> RepoResult<Option<UsageRecord>> {
        self.inner.find_open_usage(c, u).await
    }

    async fn find_open_usage_by_inviter(
        &self,
        c: Snowflake,
        inviter: InviterKey,
    ) -> RepoResult<Vec<UsageRecord>> {
        self.inner.find_open_usage_by_inviter(c, inviter).await
    }

    async fn insert_usage(&self, record: &NewUsageRecord) -> RepoResult<UsageRecord> {
        if take_one(&self.insert_conflicts) {
            self.inner.insert_usage(record).await?;
            return Err(DomainError::conflict("open usage record already exists"));
        }
        self.inner.insert_usage(record).await
    }

    async fn close_usage(&self, id: i64, left_at: DateTime<Utc>) -> RepoResult<Option<UsageRecord>> {
        self.inner.close_usage(id, left_at).await
    }

    async fn find_stats(&self, c: Snowflake, inviter: InviterKey) -> RepoResult<Option<InviteStats>> {
        self.inner.find_stats(c, inviter).await
    }

    async fn save_stats(&self, stats: &InviteStats, expected: Option<i64>) -> RepoResult<InviteStats> {
        if take_one(&self.stats_conflicts) {
            return Err(DomainError::conflict("simulated concurrent writer"));
        }
        self.inner.save_stats(stats, expected).await
    }

    async fn leaderboard(&self, c: Snowflake, limit: i64) -> RepoResult<Vec<InviteStats>> {
        self.inner.leaderboard(c, limit).await
    }

    async fn reset_stats(&self, c: Snowflake, inviter: Option<InviterKey>) -> RepoResult<u64> {
        self.inner.reset_stats(c, inviter).await
    }
}

pub struct Harness {
    pub ctx: TrackerContext,
    pub fetcher: Arc<ScriptedFetcher>,
    pub ledger: Arc<MemoryLedgerRepository>,
    pub events: BroadcastEventSink,
}

pub fn harness() -> Harness {
    harness_with(|builder| builder)
}

/// Harness whose context builder is adjusted before the build
pub fn harness_with(configure: impl FnOnce(TrackerContextBuilder) -> TrackerContextBuilder) -> Harness {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let ledger = Arc::new(MemoryLedgerRepository::new());
    let events = BroadcastEventSink::new(64);
    let builder = TrackerContext::builder()
        .ledger_repo(ledger.clone())
        .fetcher(fetcher.clone())
        .event_sink(Arc::new(events.clone()));
    let ctx = configure(builder).build().unwrap();
    Harness {
        ctx,
        fetcher,
        ledger,
        events,
    }
}

pub fn context_with_ledger(ledger: Arc<dyn LedgerRepository>) -> TrackerContext {
    TrackerContext::builder()
        .ledger_repo(ledger)
        .fetcher(Arc::new(ScriptedFetcher::default()))
        .event_sink(Arc::new(BroadcastEventSink::default()))
        .build()
        .unwrap()
}

pub fn invite(code: &str, uses: i32, inviter: i64) -> InviteSnapshot {
    InviteSnapshot::new(code, uses, Some(Snowflake::new(inviter)))
}

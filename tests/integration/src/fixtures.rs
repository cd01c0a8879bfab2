//! Test fixtures and data generators
//!
//! A scripted invite listing standing in for the remote API, unique ids,
//! and the response shapes the tests deserialize.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracker_core::{FetchError, InviteSnapshot, Snowflake, SnapshotFetcher, VanitySnapshot};

/// Counter for unique test data
static COUNTER: AtomicI64 = AtomicI64::new(1);

/// Get a unique snowflake for test data.
///
/// The timestamp part is a year back from now, so ids differ between runs
/// against a persistent database and user ids decode to an established
/// account.
pub fn unique_id() -> Snowflake {
    let issued_at = Utc::now() - Duration::days(365);
    let millis = issued_at.timestamp_millis() - Snowflake::EPOCH;
    Snowflake::new((millis << 22) + COUNTER.fetch_add(1, Ordering::SeqCst))
}

// ============================================================================
// Scripted fetcher
// ============================================================================

#[derive(Default)]
struct Listing {
    invites: Vec<InviteSnapshot>,
    vanity: Option<VanitySnapshot>,
    failure: Option<FetchError>,
}

/// In-process stand-in for the remote invite listing
#[derive(Default)]
pub struct ScriptedFetcher {
    listings: Mutex<HashMap<Snowflake, Listing>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_invites(&self, community_id: Snowflake, invites: Vec<InviteSnapshot>) {
        self.listings.lock().entry(community_id).or_default().invites = invites;
    }

    pub fn set_vanity(&self, community_id: Snowflake, vanity: Option<VanitySnapshot>) {
        self.listings.lock().entry(community_id).or_default().vanity = vanity;
    }

    /// Make every fetch for the community fail until `recover`
    pub fn fail(&self, community_id: Snowflake, error: FetchError) {
        self.listings.lock().entry(community_id).or_default().failure = Some(error);
    }

    pub fn recover(&self, community_id: Snowflake) {
        self.listings.lock().entry(community_id).or_default().failure = None;
    }
}

#[async_trait]
impl SnapshotFetcher for ScriptedFetcher {
    async fn fetch_invites(&self, community_id: Snowflake) -> Result<Vec<InviteSnapshot>, FetchError> {
        let listings = self.listings.lock();
        match listings.get(&community_id) {
            Some(Listing { failure: Some(error), .. }) => Err(error.clone()),
            Some(listing) => Ok(listing.invites.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_vanity(&self, community_id: Snowflake) -> Result<Option<VanitySnapshot>, FetchError> {
        Ok(self
            .listings
            .lock()
            .get(&community_id)
            .and_then(|listing| listing.vanity.clone()))
    }
}

/// Unlimited invite owned by `inviter`
pub fn invite(code: &str, uses: i32, inviter: Snowflake) -> InviteSnapshot {
    InviteSnapshot::new(code, uses, Some(inviter))
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
pub struct JoinRequest {
    pub user_id: String,
}

impl JoinRequest {
    pub fn new(user_id: Snowflake) -> Self {
        Self {
            user_id: user_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LeaveRequest {
    pub user_id: String,
}

impl LeaveRequest {
    pub fn new(user_id: Snowflake) -> Self {
        Self {
            user_id: user_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BonusRequest {
    pub delta: i64,
}

// ============================================================================
// Responses
// ============================================================================

/// `{"data": ...}` envelope
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct AttributionBody {
    pub kind: String,
    pub code: Option<String>,
    pub inviter_id: Option<String>,
    pub ambiguous: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinBody {
    pub user_id: String,
    pub attribution: AttributionBody,
    pub fake: bool,
}

#[derive(Debug, Deserialize)]
pub struct LeaveBody {
    pub closed: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatsBody {
    pub regular: i64,
    pub bonus: i64,
    pub leaves: i64,
    pub fake: i64,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardEntryBody {
    pub rank: usize,
    pub inviter_id: String,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardBody {
    pub entries: Vec<LeaderboardEntryBody>,
}

#[derive(Debug, Deserialize)]
pub struct TrackingBody {
    pub status: String,
    pub cached_invites: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

//! Reconciliation service
//!
//! Entry point for membership and invite notifications. Every mutation for a
//! community runs inside that community's serializer queue: fetch the live
//! listing, diff it against the cached one, replace the cache, write the
//! ledger, emit the event. Reads go straight to the ledger.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, error, info, instrument, warn};

use tracker_core::events::{
    BonusAdjustedEvent, JoinAttributedEvent, MemberLeftEvent, StatsResetEvent,
    TrackingStatusChangedEvent,
};
use tracker_core::{
    attribute, candidate_count, uses_regressions, Attribution, CommunitySnapshot, DomainError,
    DomainEvent, FetchError, InviteStats, InviterKey, LeaderboardEntry, Snowflake, StatsSummary, UnknownReason,
    UsageRecord,
};

use super::context::TrackerContext;
use super::error::{ServiceError, ServiceResult};
use super::ledger::LedgerService;
use super::tracking::TrackingStatus;

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone)]
pub struct JoinNotification {
    pub community_id: Snowflake,
    pub user_id: Snowflake,
    pub account_created_at: DateTime<Utc>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LeaveNotification {
    pub community_id: Snowflake,
    pub user_id: Snowflake,
    pub left_at: DateTime<Utc>,
}

/// Invite created or deleted. The code is informational: the refresh
/// always replaces the whole listing.
#[derive(Debug, Clone)]
pub struct InviteNotification {
    pub community_id: Snowflake,
    pub code: Option<String>,
}

/// What a join was attributed to and the record it produced
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub attribution: Attribution,
    pub record: UsageRecord,
}

/// Result of the startup snapshot load
#[derive(Debug, Default)]
pub struct PopulateReport {
    pub populated: Vec<Snowflake>,
    /// Communities whose listing could not be loaded, with the reason
    pub failures: Vec<(Snowflake, DomainError)>,
}

impl PopulateReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Communities that refused the listing. Tracking is disabled for them.
    pub fn disabled(&self) -> Vec<Snowflake> {
        self.failures
            .iter()
            .filter(|(_, e)| matches!(e, DomainError::PermissionDenied(_)))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Communities that failed for any other reason
    pub fn failed(&self) -> Vec<Snowflake> {
        self.failures
            .iter()
            .filter(|(_, e)| !matches!(e, DomainError::PermissionDenied(_)))
            .map(|(id, _)| *id)
            .collect()
    }
}

// ============================================================================
// Service
// ============================================================================

/// Reconciliation service
pub struct ReconciliationService<'a> {
    ctx: &'a TrackerContext,
}

impl<'a> ReconciliationService<'a> {
    /// Create a new ReconciliationService
    pub fn new(ctx: &'a TrackerContext) -> Self {
        Self { ctx }
    }

    /// Attribute and record a join
    #[instrument(skip(self, notification), fields(community_id = %notification.community_id, user_id = %notification.user_id))]
    pub async fn on_member_join(&self, notification: JoinNotification) -> ServiceResult<JoinOutcome> {
        let ctx = self.ctx.clone();
        self.ctx
            .serializer()
            .enqueue(notification.community_id, async move {
                ReconciliationService::new(&ctx).handle_join(notification).await
            })
            .await?
    }

    /// Close a member's usage record
    #[instrument(skip(self, notification), fields(community_id = %notification.community_id, user_id = %notification.user_id))]
    pub async fn on_member_leave(
        &self,
        notification: LeaveNotification,
    ) -> ServiceResult<Option<UsageRecord>> {
        let ctx = self.ctx.clone();
        self.ctx
            .serializer()
            .enqueue(notification.community_id, async move {
                ReconciliationService::new(&ctx).handle_leave(notification).await
            })
            .await?
    }

    /// Refresh the cached listing after an invite was created.
    ///
    /// Returns the listing now cached. A listing that cannot be observed is
    /// a `FetchUnavailable` or `PermissionDenied` error and leaves the cache
    /// untouched.
    #[instrument(skip(self, notification), fields(community_id = %notification.community_id))]
    pub async fn on_invite_created(&self, notification: InviteNotification) -> ServiceResult<CommunitySnapshot> {
        debug!(code = ?notification.code, "Invite created");
        self.enqueue_refresh(notification.community_id).await
    }

    /// Refresh the cached listing after an invite was deleted
    #[instrument(skip(self, notification), fields(community_id = %notification.community_id))]
    pub async fn on_invite_deleted(&self, notification: InviteNotification) -> ServiceResult<CommunitySnapshot> {
        debug!(code = ?notification.code, "Invite deleted");
        self.enqueue_refresh(notification.community_id).await
    }

    #[instrument(skip(self))]
    pub async fn adjust_bonus(
        &self,
        community_id: Snowflake,
        inviter_id: Snowflake,
        delta: i64,
    ) -> ServiceResult<InviteStats> {
        let ctx = self.ctx.clone();
        self.ctx
            .serializer()
            .enqueue(community_id, async move {
                let service = ReconciliationService::new(&ctx);
                let stats = LedgerService::new(&ctx)
                    .adjust_bonus(community_id, inviter_id, delta)
                    .await?;
                service
                    .emit(DomainEvent::BonusAdjusted(BonusAdjustedEvent::new(
                        community_id,
                        inviter_id,
                        delta,
                        stats.bonus,
                    )))
                    .await;
                Ok::<_, ServiceError>(stats)
            })
            .await?
    }

    #[instrument(skip(self))]
    pub async fn reset_user(&self, community_id: Snowflake, inviter_id: Snowflake) -> ServiceResult<u64> {
        self.enqueue_reset(community_id, Some(inviter_id)).await
    }

    #[instrument(skip(self))]
    pub async fn reset_all(&self, community_id: Snowflake) -> ServiceResult<u64> {
        self.enqueue_reset(community_id, None).await
    }

    pub async fn get_stats(&self, community_id: Snowflake, user_id: Snowflake) -> ServiceResult<StatsSummary> {
        LedgerService::new(self.ctx).get_stats(community_id, user_id).await
    }

    pub async fn get_leaderboard(
        &self,
        community_id: Snowflake,
        limit: i64,
    ) -> ServiceResult<Vec<LeaderboardEntry>> {
        LedgerService::new(self.ctx).get_leaderboard(community_id, limit).await
    }

    /// Who brought this member in, if they are still on the books
    pub async fn inviter_of(
        &self,
        community_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Option<UsageRecord>> {
        LedgerService::new(self.ctx).open_usage(community_id, user_id).await
    }

    pub async fn invited_by(
        &self,
        community_id: Snowflake,
        inviter_id: Snowflake,
    ) -> ServiceResult<Vec<UsageRecord>> {
        LedgerService::new(self.ctx).invited_by(community_id, inviter_id).await
    }

    pub fn tracking_status(&self, community_id: Snowflake) -> TrackingStatus {
        self.ctx.tracking().status(community_id)
    }

    /// Load the initial listing of every community.
    ///
    /// All queues are reserved before any fetch is awaited, so events that
    /// arrive meanwhile wait behind the initial load.
    #[instrument(skip(self, community_ids), fields(communities = community_ids.len()))]
    pub async fn populate(&self, community_ids: &[Snowflake]) -> PopulateReport {
        let mut ids = community_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut handles = Vec::with_capacity(ids.len());
        for community_id in ids {
            let slot = self.ctx.serializer().reserve(community_id).await;
            let ctx = self.ctx.clone();
            let handle = slot.spawn(async move {
                ReconciliationService::new(&ctx).refresh(community_id).await
            });
            handles.push(async move { (community_id, handle.await) });
        }

        let mut report = PopulateReport::default();
        for (community_id, result) in join_all(handles).await {
            self.ctx.serializer().collect_idle(community_id);
            match result {
                Ok(Ok(_)) => report.populated.push(community_id),
                Ok(Err(e)) => report.failures.push((community_id, e.into_domain(community_id))),
                Err(e) => {
                    error!(community_id = %community_id, error = %e, "Initial fetch task failed");
                    report
                        .failures
                        .push((community_id, DomainError::InternalError(e.to_string())));
                }
            }
        }

        info!(
            populated = report.populated.len(),
            failed = report.failures.len(),
            "Snapshot store populated"
        );
        report
    }

    /// Forget a community the bot was removed from.
    /// Returns whether a snapshot was cached.
    #[instrument(skip(self))]
    pub async fn evict_community(&self, community_id: Snowflake) -> ServiceResult<bool> {
        let ctx = self.ctx.clone();
        let evicted = self
            .ctx
            .serializer()
            .enqueue(community_id, async move {
                ctx.tracking().remove(community_id);
                ctx.snapshots().evict(community_id).is_some()
            })
            .await?;

        info!(community_id = %community_id, evicted, "Community evicted");
        Ok(evicted)
    }

    // ========================================================================
    // Serialized task bodies
    // ========================================================================

    async fn handle_join(&self, notification: JoinNotification) -> ServiceResult<JoinOutcome> {
        let JoinNotification {
            community_id,
            user_id,
            account_created_at,
            joined_at,
        } = notification;

        let tracking = self.ctx.tracking();
        let resuming = tracking.is_disabled(community_id);
        let attribution = if tracking.should_refetch(community_id) {
            match self.refresh_listing(community_id).await {
                // The cached listing predates the outage and cannot explain this join
                Ok(current) if resuming => {
                    self.store_listing(community_id, current);
                    Attribution::unknown(UnknownReason::TrackingDisabled)
                }
                Ok(current) => self.attribute_join(community_id, current)?,
                Err(FetchError::PermissionDenied) => Attribution::unknown(UnknownReason::TrackingDisabled),
                Err(FetchError::Unavailable(_)) => Attribution::unknown(UnknownReason::FetchFailed),
            }
        } else {
            debug!(community_id = %community_id, "Tracking disabled, fetch skipped");
            Attribution::unknown(UnknownReason::TrackingDisabled)
        };

        let record = LedgerService::new(self.ctx)
            .record_join(community_id, user_id, &attribution, joined_at, account_created_at)
            .await?;

        info!(
            community_id = %community_id,
            user_id = %user_id,
            kind = %attribution.kind(),
            code = ?attribution.code(),
            inviter = ?record.inviter,
            fake = record.fake,
            "Join attributed"
        );

        self.emit(DomainEvent::JoinAttributed(JoinAttributedEvent::new(
            community_id,
            user_id,
            &attribution,
            record.fake,
        )))
        .await;

        Ok(JoinOutcome { attribution, record })
    }

    async fn handle_leave(&self, notification: LeaveNotification) -> ServiceResult<Option<UsageRecord>> {
        let closed = LedgerService::new(self.ctx)
            .record_leave(notification.community_id, notification.user_id, notification.left_at)
            .await?;

        if let Some(record) = &closed {
            info!(
                community_id = %record.community_id,
                user_id = %record.user_id,
                inviter = ?record.inviter,
                "Member left"
            );
            self.emit(DomainEvent::MemberLeft(MemberLeftEvent::from_record(record)))
                .await;
        }

        Ok(closed)
    }

    /// Diff the fresh listing against the cached one and cache it.
    ///
    /// Malformed listings fail the join in development. Elsewhere they are
    /// logged, the cache keeps the last good listing and the join is recorded
    /// without an inviter.
    fn attribute_join(
        &self,
        community_id: Snowflake,
        current: CommunitySnapshot,
    ) -> ServiceResult<Attribution> {
        let previous = self.ctx.snapshots().get(community_id);
        if !previous.is_observed() {
            debug!(community_id = %community_id, "No cached listing to diff against");
        }

        let result = attribute(
            &previous.invites,
            &current.invites,
            previous.vanity.as_ref(),
            current.vanity.as_ref(),
        );

        let attribution = match result {
            Ok(attribution) => attribution,
            Err(e) if e.is_validation() && !self.ctx.environment().is_development() => {
                error!(community_id = %community_id, error = %e, "Malformed invite listing, join not attributed");
                return Ok(Attribution::unknown(UnknownReason::NoCandidate));
            }
            Err(e) => return Err(e.into()),
        };

        if attribution.is_ambiguous() {
            warn!(
                community_id = %community_id,
                code = ?attribution.code(),
                candidates = candidate_count(&previous.invites, &current.invites),
                "Ambiguous attribution, picked first candidate"
            );
        }

        log_regressions(community_id, &previous, &current);
        self.ctx.snapshots().replace(community_id, current);
        Ok(attribution)
    }

    async fn enqueue_refresh(&self, community_id: Snowflake) -> ServiceResult<CommunitySnapshot> {
        let ctx = self.ctx.clone();
        let refreshed = self
            .ctx
            .serializer()
            .enqueue(community_id, async move {
                ReconciliationService::new(&ctx).refresh(community_id).await
            })
            .await?;

        refreshed.map_err(|e| e.into_domain(community_id).into())
    }

    async fn enqueue_reset(&self, community_id: Snowflake, inviter_id: Option<Snowflake>) -> ServiceResult<u64> {
        let ctx = self.ctx.clone();
        self.ctx
            .serializer()
            .enqueue(community_id, async move {
                let ledger = LedgerService::new(&ctx);
                let rows = match inviter_id {
                    Some(inviter_id) => ledger.reset_user(community_id, inviter_id).await?,
                    None => ledger.reset_all(community_id).await?,
                };
                ReconciliationService::new(&ctx)
                    .emit(DomainEvent::StatsReset(StatsResetEvent::new(
                        community_id,
                        inviter_id.map(InviterKey::User),
                        rows,
                    )))
                    .await;
                Ok::<_, ServiceError>(rows)
            })
            .await?
    }

    /// Fetch and cache the listing without attributing anything
    async fn refresh(&self, community_id: Snowflake) -> Result<CommunitySnapshot, FetchError> {
        let current = self.refresh_listing(community_id).await?;
        self.store_listing(community_id, current.clone());
        Ok(current)
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    fn store_listing(&self, community_id: Snowflake, current: CommunitySnapshot) {
        let previous = self.ctx.snapshots().get(community_id);
        log_regressions(community_id, &previous, &current);
        debug!(community_id = %community_id, invites = current.invites.len(), "Listing refreshed");
        self.ctx.snapshots().replace(community_id, current);
    }

    /// Fetch the live listing and track permission transitions.
    ///
    /// Never touches the snapshot store.
    async fn refresh_listing(&self, community_id: Snowflake) -> Result<CommunitySnapshot, FetchError> {
        let fetcher = self.ctx.fetcher();
        let fetched = match fetcher.fetch_invites(community_id).await {
            Ok(invites) => fetcher
                .fetch_vanity(community_id)
                .await
                .map(|vanity| CommunitySnapshot::fetched(invites, vanity)),
            Err(e) => Err(e),
        };

        match fetched {
            Ok(snapshot) => {
                if self.ctx.tracking().enable(community_id) {
                    info!(community_id = %community_id, "Invite tracking re-enabled");
                    self.emit_tracking_status(community_id, true).await;
                }
                Ok(snapshot)
            }
            Err(FetchError::PermissionDenied) => {
                if self.ctx.tracking().disable(community_id) {
                    warn!(community_id = %community_id, "Missing permission to list invites, tracking disabled");
                    self.emit_tracking_status(community_id, false).await;
                }
                Err(FetchError::PermissionDenied)
            }
            Err(e) => {
                warn!(community_id = %community_id, error = %e, "Invite listing fetch failed");
                Err(e)
            }
        }
    }

    async fn emit_tracking_status(&self, community_id: Snowflake, enabled: bool) {
        self.emit(DomainEvent::TrackingStatusChanged(TrackingStatusChangedEvent::new(
            community_id,
            enabled,
        )))
        .await;
    }

    /// Deliver an event. Sink failures are logged, never propagated.
    async fn emit(&self, event: DomainEvent) {
        let event_type = event.event_type();
        let community_id = event.community_id();
        if let Err(e) = self.ctx.event_sink().emit(event).await {
            warn!(
                community_id = %community_id,
                event_type,
                error = %e,
                "Failed to deliver domain event"
            );
        }
    }
}

fn log_regressions(community_id: Snowflake, previous: &CommunitySnapshot, current: &CommunitySnapshot) {
    for code in uses_regressions(&previous.invites, &current.invites) {
        warn!(community_id = %community_id, code, "Invite uses went down between observations");
    }
}

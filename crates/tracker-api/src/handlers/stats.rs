//! Ledger handlers
//!
//! Stats lookups, the leaderboard, and the admin operations that adjust or
//! reset counters.

use axum::{
    extract::{Path, State},
    Json,
};
use tracker_core::{Snowflake, StatsSummary};
use tracker_service::dto::{
    ApiResponse, BonusRequest, EvictResponse, InviterResponse, LeaderboardEntryResponse,
    LeaderboardQuery, LeaderboardResponse, ResetAllQuery, ResetResponse, StatsResponse,
    TrackingResponse, UsageRecordResponse,
};
use tracker_service::ReconciliationService;

use crate::extractors::{ApiQuery, CommunityPath, CommunityUserPath, ValidatedJson};
use crate::response::{ApiError, ApiResult};
use crate::state::AppState;

fn stats_response(community_id: Snowflake, user_id: Snowflake, stats: StatsSummary) -> StatsResponse {
    StatsResponse {
        community_id: community_id.to_string(),
        user_id: user_id.to_string(),
        regular: stats.regular,
        bonus: stats.bonus,
        leaves: stats.leaves,
        fake: stats.fake,
        total: stats.total,
    }
}

// ============================================================================
// Reads
// ============================================================================

/// Counters for one inviter (zeroes if they never invited anyone)
///
/// GET /communities/{community_id}/stats/{user_id}
pub async fn get_stats(
    State(state): State<AppState>,
    Path(path): Path<CommunityUserPath>,
) -> ApiResult<Json<ApiResponse<StatsResponse>>> {
    let (community_id, user_id) = path.ids()?;

    let service = ReconciliationService::new(state.tracker());
    let stats = service.get_stats(community_id, user_id).await?;
    Ok(Json(ApiResponse::new(stats_response(community_id, user_id, stats))))
}

/// Top inviters by total
///
/// GET /communities/{community_id}/leaderboard?limit=
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(path): Path<CommunityPath>,
    ApiQuery(query): ApiQuery<LeaderboardQuery>,
) -> ApiResult<Json<ApiResponse<LeaderboardResponse>>> {
    let community_id = path.community_id()?;

    let service = ReconciliationService::new(state.tracker());
    let entries = service.get_leaderboard(community_id, query.limit()).await?;

    Ok(Json(ApiResponse::new(LeaderboardResponse {
        community_id: community_id.to_string(),
        entries: entries.iter().map(LeaderboardEntryResponse::from).collect(),
    })))
}

/// Open usage record of a member, if any
///
/// GET /communities/{community_id}/members/{user_id}/inviter
pub async fn get_inviter(
    State(state): State<AppState>,
    Path(path): Path<CommunityUserPath>,
) -> ApiResult<Json<ApiResponse<InviterResponse>>> {
    let (community_id, user_id) = path.ids()?;

    let service = ReconciliationService::new(state.tracker());
    let record = service.inviter_of(community_id, user_id).await?;

    Ok(Json(ApiResponse::new(InviterResponse {
        user_id: user_id.to_string(),
        record: record.map(UsageRecordResponse::from),
    })))
}

/// Members currently credited to an inviter
///
/// GET /communities/{community_id}/stats/{user_id}/invited
pub async fn get_invited(
    State(state): State<AppState>,
    Path(path): Path<CommunityUserPath>,
) -> ApiResult<Json<ApiResponse<Vec<UsageRecordResponse>>>> {
    let (community_id, inviter_id) = path.ids()?;

    let service = ReconciliationService::new(state.tracker());
    let records = service.invited_by(community_id, inviter_id).await?;
    Ok(Json(ApiResponse::new(
        records.iter().map(UsageRecordResponse::from).collect(),
    )))
}

/// Tracking status and cached listing size
///
/// GET /communities/{community_id}/tracking
pub async fn get_tracking(
    State(state): State<AppState>,
    Path(path): Path<CommunityPath>,
) -> ApiResult<Json<ApiResponse<TrackingResponse>>> {
    let community_id = path.community_id()?;

    let service = ReconciliationService::new(state.tracker());
    let snapshot = state.tracker().snapshots().get(community_id);

    Ok(Json(ApiResponse::new(TrackingResponse {
        community_id: community_id.to_string(),
        status: service.tracking_status(community_id),
        cached_invites: snapshot.is_observed().then_some(snapshot.invites.len()),
    })))
}

// ============================================================================
// Admin writes
// ============================================================================

/// Add (or remove) manual bonus invites
///
/// POST /communities/{community_id}/stats/{user_id}/bonus
pub async fn adjust_bonus(
    State(state): State<AppState>,
    Path(path): Path<CommunityUserPath>,
    ValidatedJson(request): ValidatedJson<BonusRequest>,
) -> ApiResult<Json<ApiResponse<StatsResponse>>> {
    let (community_id, user_id) = path.ids()?;

    let service = ReconciliationService::new(state.tracker());
    let stats = service.adjust_bonus(community_id, user_id, request.delta).await?;
    Ok(Json(ApiResponse::new(stats_response(
        community_id,
        user_id,
        stats.summary(),
    ))))
}

/// Zero one inviter's counters
///
/// DELETE /communities/{community_id}/stats/{user_id}
pub async fn reset_user(
    State(state): State<AppState>,
    Path(path): Path<CommunityUserPath>,
) -> ApiResult<Json<ApiResponse<ResetResponse>>> {
    let (community_id, user_id) = path.ids()?;

    let service = ReconciliationService::new(state.tracker());
    let rows = service.reset_user(community_id, user_id).await?;

    Ok(Json(ApiResponse::new(ResetResponse {
        community_id: community_id.to_string(),
        user_id: Some(user_id.to_string()),
        rows,
    })))
}

/// Zero every counter in the community
///
/// DELETE /communities/{community_id}/stats?confirm=true
pub async fn reset_all(
    State(state): State<AppState>,
    Path(path): Path<CommunityPath>,
    ApiQuery(query): ApiQuery<ResetAllQuery>,
) -> ApiResult<Json<ApiResponse<ResetResponse>>> {
    let community_id = path.community_id()?;
    if !query.confirm {
        return Err(ApiError::invalid_query(
            "Resetting every counter requires confirm=true",
        ));
    }

    let service = ReconciliationService::new(state.tracker());
    let rows = service.reset_all(community_id).await?;

    Ok(Json(ApiResponse::new(ResetResponse {
        community_id: community_id.to_string(),
        user_id: None,
        rows,
    })))
}

/// Forget the cached listing and tracking status of a community the bot left
///
/// DELETE /communities/{community_id}
pub async fn evict_community(
    State(state): State<AppState>,
    Path(path): Path<CommunityPath>,
) -> ApiResult<Json<ApiResponse<EvictResponse>>> {
    let community_id = path.community_id()?;

    let service = ReconciliationService::new(state.tracker());
    let evicted = service.evict_community(community_id).await?;

    Ok(Json(ApiResponse::new(EvictResponse {
        community_id: community_id.to_string(),
        evicted,
    })))
}

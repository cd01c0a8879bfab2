//! Platform event handlers
//!
//! The gateway relay posts membership and invite events here. Each handler
//! validates the body, then hands the notification to the reconciliation
//! service, which orders it behind earlier work for the same community.

use axum::{
    extract::{Path, State},
    Json,
};
use tracker_service::dto::{
    ApiResponse, InviteEventRequest, JoinResponse, LeaveResponse, MemberJoinRequest,
    MemberLeaveRequest, RefreshResponse, UsageRecordResponse,
};
use tracker_service::ReconciliationService;

use crate::extractors::{CommunityPath, OptionalValidatedJson, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// Attribute and record a join
///
/// POST /communities/{community_id}/events/member-join
pub async fn member_join(
    State(state): State<AppState>,
    Path(path): Path<CommunityPath>,
    ValidatedJson(request): ValidatedJson<MemberJoinRequest>,
) -> ApiResult<Json<ApiResponse<JoinResponse>>> {
    let community_id = path.community_id()?;

    let service = ReconciliationService::new(state.tracker());
    let outcome = service
        .on_member_join(request.into_notification(community_id))
        .await?;
    Ok(Json(ApiResponse::new(JoinResponse::from(outcome))))
}

/// Close the member's usage record and reverse the credit
///
/// POST /communities/{community_id}/events/member-leave
pub async fn member_leave(
    State(state): State<AppState>,
    Path(path): Path<CommunityPath>,
    ValidatedJson(request): ValidatedJson<MemberLeaveRequest>,
) -> ApiResult<Json<ApiResponse<LeaveResponse>>> {
    let community_id = path.community_id()?;
    let user_id = request.user_id;

    let service = ReconciliationService::new(state.tracker());
    let closed = service
        .on_member_leave(request.into_notification(community_id))
        .await?;

    Ok(Json(ApiResponse::new(LeaveResponse {
        user_id: user_id.to_string(),
        closed: closed.is_some(),
        record: closed.map(UsageRecordResponse::from),
    })))
}

/// Refresh the cached listing after an invite was created
///
/// POST /communities/{community_id}/events/invite-create
pub async fn invite_create(
    State(state): State<AppState>,
    Path(path): Path<CommunityPath>,
    OptionalValidatedJson(request): OptionalValidatedJson<InviteEventRequest>,
) -> ApiResult<Json<ApiResponse<RefreshResponse>>> {
    let community_id = path.community_id()?;
    let request = request.unwrap_or_default();

    let service = ReconciliationService::new(state.tracker());
    let listing = service
        .on_invite_created(request.into_notification(community_id))
        .await?;
    Ok(Json(ApiResponse::new(RefreshResponse::from(&listing))))
}

/// Refresh the cached listing after an invite was deleted
///
/// POST /communities/{community_id}/events/invite-delete
pub async fn invite_delete(
    State(state): State<AppState>,
    Path(path): Path<CommunityPath>,
    OptionalValidatedJson(request): OptionalValidatedJson<InviteEventRequest>,
) -> ApiResult<Json<ApiResponse<RefreshResponse>>> {
    let community_id = path.community_id()?;
    let request = request.unwrap_or_default();

    let service = ReconciliationService::new(state.tracker());
    let listing = service
        .on_invite_deleted(request.into_notification(community_id))
        .await?;
    Ok(Json(ApiResponse::new(RefreshResponse::from(&listing))))
}

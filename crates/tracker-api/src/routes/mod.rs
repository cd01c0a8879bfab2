//! Route definitions
//!
//! All API routes organized by concern and mounted under /api/v1.

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{events, health, stats};
use crate::state::AppState;

/// Create the main API router (health routes are mounted separately)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(event_routes())
        .merge(stats_routes())
        .merge(community_routes())
}

/// Inbound platform events
fn event_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/communities/:community_id/events/member-join",
            post(events::member_join),
        )
        .route(
            "/communities/:community_id/events/member-leave",
            post(events::member_leave),
        )
        .route(
            "/communities/:community_id/events/invite-create",
            post(events::invite_create),
        )
        .route(
            "/communities/:community_id/events/invite-delete",
            post(events::invite_delete),
        )
}

/// Ledger reads and admin writes
fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/communities/:community_id/stats", delete(stats::reset_all))
        .route(
            "/communities/:community_id/stats/:user_id",
            get(stats::get_stats).delete(stats::reset_user),
        )
        .route(
            "/communities/:community_id/stats/:user_id/bonus",
            post(stats::adjust_bonus),
        )
        .route(
            "/communities/:community_id/stats/:user_id/invited",
            get(stats::get_invited),
        )
        .route(
            "/communities/:community_id/leaderboard",
            get(stats::get_leaderboard),
        )
        .route(
            "/communities/:community_id/members/:user_id/inviter",
            get(stats::get_inviter),
        )
}

/// Community lifecycle
fn community_routes() -> Router<AppState> {
    Router::new()
        .route("/communities/:community_id", delete(stats::evict_community))
        .route("/communities/:community_id/tracking", get(stats::get_tracking))
}

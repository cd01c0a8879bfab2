//! Data transfer objects for API requests and responses
//!
//! This module provides:
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs
//! - Mappers between domain entities, DTOs and service notifications

pub mod mappers;
pub mod requests;
pub mod responses;

// Re-export commonly used request types
pub use requests::{
    BonusRequest, InviteEventRequest, LeaderboardQuery, MemberJoinRequest, MemberLeaveRequest,
    ResetAllQuery,
};

// Re-export commonly used response types
pub use responses::{
    ApiResponse, AttributionResponse, EvictResponse, HealthChecks, HealthResponse, InviterResponse,
    JoinResponse, LeaderboardEntryResponse, LeaderboardResponse, LeaveResponse,
    ReadinessResponse, RefreshResponse, ResetResponse, StatsResponse, TrackingResponse,
    UsageRecordResponse,
};

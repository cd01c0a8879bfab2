//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Remote Observation Errors
    // =========================================================================
    #[error("Invite listing unavailable for community {community_id}: {reason}")]
    FetchUnavailable { community_id: Snowflake, reason: String },

    #[error("Missing permission to list invites in community {0}")]
    PermissionDenied(Snowflake),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Conflicting write: {0}")]
    ConflictingWrite(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::FetchUnavailable { .. } => "FETCH_UNAVAILABLE",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ConflictingWrite(_) => "CONFLICTING_WRITE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a conflicting-write error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::ConflictingWrite(msg.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConflictingWrite(_))
    }

    /// Check if the remote listing could not be observed
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::FetchUnavailable { .. } | Self::PermissionDenied(_))
    }
}

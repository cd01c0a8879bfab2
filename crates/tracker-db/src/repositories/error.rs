//! Error handling utilities for repositories

use sqlx::Error as SqlxError;
use tracker_core::error::DomainError;
use tracker_core::value_objects::{InviterKey, Snowflake};

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// A second open usage record for the same member
pub fn open_usage_exists(community_id: Snowflake, user_id: Snowflake) -> DomainError {
    DomainError::conflict(format!(
        "user {user_id} already has an open usage record in community {community_id}"
    ))
}

/// Stats row changed (or appeared) since it was read
pub fn stale_stats(community_id: Snowflake, inviter: InviterKey) -> DomainError {
    DomainError::conflict(format!(
        "invite stats for {inviter} in community {community_id} changed concurrently"
    ))
}

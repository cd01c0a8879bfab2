//! Snapshot fetcher port - pulls the live invite listing from the remote service

use async_trait::async_trait;
use thiserror::Error;

use crate::entities::{InviteSnapshot, VanitySnapshot};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Why a listing could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The bot may not list invites in this community
    #[error("missing permission to list invites")]
    PermissionDenied,

    /// Remote error, timeout, or malformed response
    #[error("invite listing unavailable: {0}")]
    Unavailable(String),
}

impl FetchError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Attach the community for reporting
    pub fn into_domain(self, community_id: Snowflake) -> DomainError {
        match self {
            Self::PermissionDenied => DomainError::PermissionDenied(community_id),
            Self::Unavailable(reason) => DomainError::FetchUnavailable { community_id, reason },
        }
    }
}

/// Remote invite listing, injected into the reconciliation service.
///
/// Retry and backoff, if any, belong to the implementation.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Current invites in remote order
    async fn fetch_invites(&self, community_id: Snowflake) -> Result<Vec<InviteSnapshot>, FetchError>;

    /// Vanity URL counter, `None` if the community has no vanity URL
    async fn fetch_vanity(&self, community_id: Snowflake) -> Result<Option<VanitySnapshot>, FetchError>;
}

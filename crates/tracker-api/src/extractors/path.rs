//! Path parameter extractors
//!
//! Path segments arrive as strings and are parsed into snowflakes here so a
//! malformed id is a 400 with a stable error code rather than a 404.

use serde::Deserialize;
use tracker_core::Snowflake;

use crate::response::ApiError;

/// Ids must be positive; zero is the reserved vanity key
fn parse_id(raw: &str, field: &str) -> Result<Snowflake, ApiError> {
    Snowflake::parse(raw)
        .ok()
        .filter(|id| id.into_inner() > 0)
        .ok_or_else(|| ApiError::invalid_path(format!("Invalid {field} format")))
}

/// Path parameters with community id
#[derive(Debug, Deserialize)]
pub struct CommunityPath {
    pub community_id: String,
}

impl CommunityPath {
    /// Parse community_id as Snowflake
    pub fn community_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.community_id, "community_id")
    }
}

/// Path parameters with community id and user id
#[derive(Debug, Deserialize)]
pub struct CommunityUserPath {
    pub community_id: String,
    pub user_id: String,
}

impl CommunityUserPath {
    /// Parse community_id as Snowflake
    pub fn community_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.community_id, "community_id")
    }

    /// Parse user_id as Snowflake
    pub fn user_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.user_id, "user_id")
    }

    pub fn ids(&self) -> Result<(Snowflake, Snowflake), ApiError> {
        Ok((self.community_id()?, self.user_id()?))
    }
}

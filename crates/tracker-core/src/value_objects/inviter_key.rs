//! Inviter key - the ledger key an attributed join is credited to

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Snowflake;

/// Who gets credited for a join in `invite_stats`
///
/// Vanity-URL joins have no human inviter; they are credited to a reserved
/// key so the vanity link shows up in statistics like any other inviter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum InviterKey {
    User(Snowflake),
    Vanity,
}

impl InviterKey {
    /// Reserved inviter id under which vanity joins are stored.
    /// Real snowflakes are never zero.
    pub const VANITY_STORAGE_ID: i64 = 0;

    /// Column value used by persistent ledgers
    #[inline]
    pub fn storage_id(&self) -> i64 {
        match self {
            Self::User(id) => id.into_inner(),
            Self::Vanity => Self::VANITY_STORAGE_ID,
        }
    }

    /// Rebuild a key from its column value
    #[inline]
    pub fn from_storage_id(id: i64) -> Self {
        if id == Self::VANITY_STORAGE_ID {
            Self::Vanity
        } else {
            Self::User(Snowflake::new(id))
        }
    }

    /// The human inviter, if any
    pub fn user_id(&self) -> Option<Snowflake> {
        match self {
            Self::User(id) => Some(*id),
            Self::Vanity => None,
        }
    }

    pub fn is_vanity(&self) -> bool {
        matches!(self, Self::Vanity)
    }
}

impl From<Snowflake> for InviterKey {
    fn from(id: Snowflake) -> Self {
        Self::User(id)
    }
}

impl fmt::Display for InviterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "{id}"),
            Self::Vanity => f.write_str("vanity"),
        }
    }
}

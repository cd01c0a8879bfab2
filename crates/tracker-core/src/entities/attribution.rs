//! Attribution - the inferred cause of a member's join

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::{InviterKey, Snowflake};

/// Coarse attribution category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionKind {
    Normal,
    Vanity,
    Unknown,
}

impl AttributionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Vanity => "vanity",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Self::Normal),
            "vanity" => Some(Self::Vanity),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for AttributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a join could not be attributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownReason {
    /// Snapshots were compared and nothing changed
    NoCandidate,
    /// The invite listing could not be fetched
    FetchFailed,
    /// Listing invites is not permitted for this community
    TrackingDisabled,
}

impl UnknownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCandidate => "no_candidate",
            Self::FetchFailed => "fetch_failed",
            Self::TrackingDisabled => "tracking_disabled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "no_candidate" => Some(Self::NoCandidate),
            "fetch_failed" => Some(Self::FetchFailed),
            "tracking_disabled" => Some(Self::TrackingDisabled),
            _ => None,
        }
    }

    /// Degraded observability, as opposed to a genuine unattributed join
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::NoCandidate)
    }
}

/// Result of diffing two snapshots for one join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attribution {
    /// A specific invite was consumed
    Normal {
        code: String,
        inviter_id: Option<Snowflake>,
        /// Several invites moved between observations; the first by fetch
        /// order was picked
        ambiguous: bool,
    },
    /// The vanity URL counter moved
    Vanity { code: String },
    Unknown { reason: UnknownReason },
}

impl Attribution {
    pub fn unknown(reason: UnknownReason) -> Self {
        Self::Unknown { reason }
    }

    pub fn kind(&self) -> AttributionKind {
        match self {
            Self::Normal { .. } => AttributionKind::Normal,
            Self::Vanity { .. } => AttributionKind::Vanity,
            Self::Unknown { .. } => AttributionKind::Unknown,
        }
    }

    /// Ledger key to credit, if any
    pub fn inviter_key(&self) -> Option<InviterKey> {
        match self {
            Self::Normal { inviter_id, .. } => inviter_id.map(InviterKey::User),
            Self::Vanity { .. } => Some(InviterKey::Vanity),
            Self::Unknown { .. } => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Normal { code, .. } | Self::Vanity { code } => Some(code),
            Self::Unknown { .. } => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Normal { ambiguous: true, .. })
    }

    pub fn unknown_reason(&self) -> Option<UnknownReason> {
        match self {
            Self::Unknown { reason } => Some(*reason),
            _ => None,
        }
    }
}

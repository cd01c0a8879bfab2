//! Discord REST invite fetcher

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use tracker_common::{AppError, DiscordConfig};
use tracker_core::{FetchError, InviteSnapshot, Snowflake, SnapshotFetcher, VanitySnapshot};

/// Connection settings for the Discord API
#[derive(Debug, Clone)]
pub struct DiscordFetcherConfig {
    pub api_base: String,
    pub bot_token: String,
    pub timeout: Duration,
}

impl From<&DiscordConfig> for DiscordFetcherConfig {
    fn from(config: &DiscordConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Fetches invite listings with a bot token
#[derive(Clone)]
pub struct DiscordFetcher {
    client: Client,
    api_base: String,
}

impl std::fmt::Debug for DiscordFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordFetcher")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl DiscordFetcher {
    /// Build the HTTP client with the bot authorization header baked in
    pub fn new(config: DiscordFetcherConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bot {}", config.bot_token))
            .map_err(|_| AppError::Config("DISCORD_BOT_TOKEN is not a valid header value".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base,
        })
    }

    pub fn from_config(config: &DiscordConfig) -> Result<Self, AppError> {
        Self::new(DiscordFetcherConfig::from(config))
    }

    fn invites_url(&self, community_id: Snowflake) -> String {
        format!("{}/guilds/{community_id}/invites", self.api_base)
    }

    fn vanity_url(&self, community_id: Snowflake) -> String {
        format!("{}/guilds/{community_id}/vanity-url", self.api_base)
    }
}

#[async_trait]
impl SnapshotFetcher for DiscordFetcher {
    #[instrument(skip(self))]
    async fn fetch_invites(&self, community_id: Snowflake) -> Result<Vec<InviteSnapshot>, FetchError> {
        let response = self
            .client
            .get(self.invites_url(community_id))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Invite listing request rejected");
            return Err(listing_error(status));
        }

        let invites: Vec<RemoteInvite> = response.json().await.map_err(transport_error)?;
        debug!(count = invites.len(), "Invite listing fetched");
        Ok(invites.into_iter().map(InviteSnapshot::from).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_vanity(&self, community_id: Snowflake) -> Result<Option<VanitySnapshot>, FetchError> {
        let response = self
            .client
            .get(self.vanity_url(community_id))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if vanity_unsupported(status) {
            debug!(%status, "Community has no vanity URL");
            return Ok(None);
        }
        if !status.is_success() {
            warn!(%status, "Vanity request rejected");
            return Err(listing_error(status));
        }

        let vanity: RemoteVanity = response.json().await.map_err(transport_error)?;
        Ok(vanity.into_snapshot())
    }
}

// ============================================================================
// Status mapping
// ============================================================================

/// Error for a non-success invite listing response
fn listing_error(status: StatusCode) -> FetchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::PermissionDenied,
        other => FetchError::unavailable(format!("remote returned {other}")),
    }
}

/// The vanity endpoint answers 403/404 for communities without the feature
fn vanity_unsupported(status: StatusCode) -> bool {
    matches!(status, StatusCode::FORBIDDEN | StatusCode::NOT_FOUND)
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::unavailable("request timed out")
    } else if err.is_decode() {
        FetchError::unavailable(format!("malformed response: {err}"))
    } else {
        FetchError::unavailable(err.to_string())
    }
}

// ============================================================================
// Wire models
// ============================================================================

#[derive(Debug, Deserialize)]
struct RemoteInvite {
    code: String,
    #[serde(default)]
    uses: i32,
    #[serde(default)]
    max_uses: i32,
    #[serde(default)]
    max_age: i32,
    created_at: Option<DateTime<Utc>>,
    inviter: Option<RemoteUser>,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Snowflake,
}

#[derive(Debug, Deserialize)]
struct RemoteVanity {
    code: Option<String>,
    #[serde(default)]
    uses: i32,
}

impl From<RemoteInvite> for InviteSnapshot {
    fn from(remote: RemoteInvite) -> Self {
        let snapshot = InviteSnapshot::new(remote.code, remote.uses, remote.inviter.map(|u| u.id))
            .with_max_uses(remote.max_uses)
            .with_max_age(remote.max_age);
        match remote.created_at {
            Some(created_at) => snapshot.with_created_at(created_at),
            None => snapshot,
        }
    }
}

impl RemoteVanity {
    /// A null code means the vanity URL is unset
    fn into_snapshot(self) -> Option<VanitySnapshot> {
        self.code
            .filter(|code| !code.is_empty())
            .map(|code| VanitySnapshot::new(code, self.uses))
    }
}

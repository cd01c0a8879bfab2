//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    /// Without Redis, domain events stay in-process
    pub redis: Option<RedisConfig>,
    pub discord: DiscordConfig,
    pub tracker: TrackerConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Required only for the postgres ledger backend
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Discord REST API configuration used by the snapshot fetcher
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
    pub bot_token: String,
    #[serde(default = "default_discord_timeout")]
    pub timeout_secs: u64,
}

/// Where the ledger lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for LedgerBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue("LEDGER_BACKEND", other.to_string())),
        }
    }
}

/// Invite tracking behavior
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Communities to populate before accepting events
    #[serde(default)]
    pub communities: Vec<i64>,
    /// Accounts younger than this are flagged fake; `None` disables the check
    pub fake_account_min_age_days: Option<i64>,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Seconds between listing fetch attempts for a community with tracking disabled
    #[serde(default = "default_permission_retry_secs")]
    pub permission_retry_secs: u64,
    #[serde(default)]
    pub ledger_backend: LedgerBackend,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            communities: Vec::new(),
            fake_account_min_age_days: None,
            event_buffer: default_event_buffer(),
            permission_retry_secs: default_permission_retry_secs(),
            ledger_backend: LedgerBackend::default(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "invite-tracker".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_discord_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_discord_timeout() -> u64 {
    10
}

fn default_event_buffer() -> usize {
    1024
}

fn default_permission_retry_secs() -> u64 {
    60
}

/// Parse a comma-separated list of community ids
fn parse_communities(raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .ok_or_else(|| ConfigError::InvalidValue("TRACKER_COMMUNITIES", s.to_string()))
        })
        .collect()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let ledger_backend = match env::var("LEDGER_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => LedgerBackend::default(),
        };

        let database_url = env::var("DATABASE_URL").ok();
        if ledger_backend == LedgerBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingVar("DATABASE_URL"));
        }

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            api: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| default_host()),
                port: env::var("API_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or(ConfigError::MissingVar("API_PORT"))?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_max_connections),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_min_connections),
            },
            redis: env::var("REDIS_URL").ok().map(|url| RedisConfig {
                url,
                max_connections: env::var("REDIS_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_redis_max_connections),
            }),
            discord: DiscordConfig {
                api_base: env::var("DISCORD_API_BASE")
                    .unwrap_or_else(|_| default_discord_api_base()),
                bot_token: env::var("DISCORD_BOT_TOKEN")
                    .map_err(|_| ConfigError::MissingVar("DISCORD_BOT_TOKEN"))?,
                timeout_secs: env::var("DISCORD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_discord_timeout),
            },
            tracker: TrackerConfig {
                communities: env::var("TRACKER_COMMUNITIES")
                    .ok()
                    .map(|s| parse_communities(&s))
                    .transpose()?
                    .unwrap_or_default(),
                fake_account_min_age_days: env::var("TRACKER_FAKE_ACCOUNT_MIN_AGE_DAYS")
                    .ok()
                    .map(|s| {
                        s.parse::<i64>()
                            .ok()
                            .filter(|days| *days >= 0)
                            .ok_or(ConfigError::InvalidValue("TRACKER_FAKE_ACCOUNT_MIN_AGE_DAYS", s))
                    })
                    .transpose()?,
                event_buffer: env::var("TRACKER_EVENT_BUFFER")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|n| *n > 0)
                    .unwrap_or_else(default_event_buffer),
                permission_retry_secs: env::var("TRACKER_PERMISSION_RETRY_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_permission_retry_secs),
                ledger_backend,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

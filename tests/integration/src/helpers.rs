//! Test helpers for integration tests
//!
//! Provides utilities for spawning test servers and making HTTP requests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracker_api::{create_app, AppState};
use tracker_common::Environment;
use tracker_core::{LedgerRepository, MinAccountAge, Snowflake};
use tracker_db::MemoryLedgerRepository;
use tracker_service::{BroadcastEventSink, TrackerContext};

use crate::fixtures::ScriptedFetcher;

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    /// Scripted remote listing; edit it between requests
    pub fetcher: Arc<ScriptedFetcher>,
    /// Subscribe before acting to observe domain events
    pub events: BroadcastEventSink,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server backed by the in-memory ledger
    pub async fn start() -> Result<Self> {
        Self::start_with_ledger(Arc::new(MemoryLedgerRepository::new())).await
    }

    /// Start a server over an existing ledger
    pub async fn start_with_ledger(ledger: Arc<dyn LedgerRepository>) -> Result<Self> {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let events = BroadcastEventSink::default();

        let tracker = TrackerContext::builder()
            .ledger_repo(ledger)
            .fetcher(fetcher.clone())
            .event_sink(Arc::new(events.clone()))
            .fake_policy(Arc::new(MinAccountAge::new(7)))
            .environment(Environment::Development)
            .build()?;

        let app = create_app(AppState::new(tracker));

        // Ephemeral port
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            addr,
            client,
            fetcher,
            events,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// `/api/v1/communities/{id}` prefix
    pub fn community_path(&self, community_id: Snowflake, rest: &str) -> String {
        format!("/api/v1/communities/{community_id}{rest}")
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).json(body).send().await?)
    }

    /// Make a POST request without a body
    pub async fn post_empty(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).send().await?)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.delete(&url).send().await?)
    }
}

/// Helper to check if a PostgreSQL ledger is available
pub fn check_database_env() -> bool {
    dotenvy::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("Skipping test: DATABASE_URL not set");
        return false;
    }
    true
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}

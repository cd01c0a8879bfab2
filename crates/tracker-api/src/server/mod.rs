//! Server setup and initialization
//!
//! Wires the ledger backend, event sink and fetcher into a tracker context,
//! populates configured communities, and runs the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracker_cache::{Publisher, RedisPool};
use tracker_common::{AppConfig, AppError, AppResult, LedgerBackend};
use tracker_core::{EventSink, FakeAccountPolicy, LedgerRepository, MinAccountAge, NeverFake, Snowflake};
use tracker_db::{create_pool, run_migrations, MemoryLedgerRepository, PgLedgerRepository};
use tracker_service::{BroadcastEventSink, ReconciliationService, TrackerContext};

use crate::fetcher::DiscordFetcher;
use crate::middleware::apply_middleware;
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let router = create_router().merge(health_routes());
    let router = apply_middleware(router);
    router.with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: &AppConfig) -> AppResult<AppState> {
    let mut builder = TrackerContext::builder()
        .environment(config.app.env)
        .fake_policy(fake_policy(config))
        .permission_retry(Duration::from_secs(config.tracker.permission_retry_secs));

    // Ledger
    let ledger: Arc<dyn LedgerRepository> = match config.tracker.ledger_backend {
        LedgerBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres ledger".to_string()))?;

            info!("Connecting to PostgreSQL...");
            let db_config = tracker_db::DatabaseConfig::new(
                url,
                config.database.max_connections,
                config.database.min_connections,
            );
            let pool = create_pool(&db_config)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            run_migrations(&pool)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            info!("PostgreSQL connection established");

            builder = builder.pool(pool.clone());
            Arc::new(PgLedgerRepository::new(pool))
        }
        LedgerBackend::Memory => {
            warn!("Using the in-memory ledger; counters are lost on restart");
            Arc::new(MemoryLedgerRepository::new())
        }
    };

    // Events
    let event_sink: Arc<dyn EventSink> = match &config.redis {
        Some(redis_config) => {
            info!("Connecting to Redis...");
            let redis_pool =
                RedisPool::from_config(redis_config).map_err(|e| AppError::Cache(e.to_string()))?;
            builder = builder.redis_pool(redis_pool.clone());
            Arc::new(Publisher::new(redis_pool))
        }
        None => {
            info!(
                capacity = config.tracker.event_buffer,
                "REDIS_URL not set; domain events stay in-process"
            );
            Arc::new(BroadcastEventSink::new(config.tracker.event_buffer))
        }
    };

    // Remote invite listing
    let fetcher = Arc::new(DiscordFetcher::from_config(&config.discord)?);

    let tracker = builder
        .ledger_repo(ledger)
        .event_sink(event_sink)
        .fetcher(fetcher)
        .build()
        .map_err(AppError::internal)?;

    Ok(AppState::new(tracker))
}

fn fake_policy(config: &AppConfig) -> Arc<dyn FakeAccountPolicy> {
    match config.tracker.fake_account_min_age_days {
        Some(days) => {
            info!(min_days = days, "Flagging young accounts as fake");
            Arc::new(MinAccountAge::new(days))
        }
        None => Arc::new(NeverFake),
    }
}

/// Load the initial invite listing of every configured community.
///
/// Failures are logged, not fatal: those communities start with an empty
/// listing and recover on their next successful fetch.
pub async fn populate_communities(state: &AppState, community_ids: &[i64]) {
    if community_ids.is_empty() {
        return;
    }

    let ids: Vec<Snowflake> = community_ids.iter().copied().map(Snowflake::new).collect();
    let service = ReconciliationService::new(state.tracker());
    let report = service.populate(&ids).await;

    for (community_id, error) in &report.failures {
        warn!(
            community_id = %community_id,
            code = error.code(),
            error = %error,
            "Community not populated"
        );
    }
    if report.is_complete() {
        info!(populated = report.populated.len(), "Communities populated");
    } else {
        warn!(
            populated = report.populated.len(),
            disabled = report.disabled().len(),
            failed = report.failed().len(),
            "Some communities could not be populated"
        );
    }
}

/// Run the HTTP server until ctrl-c (or SIGTERM on unix)
pub async fn run_server(app: Router, addr: SocketAddr) -> AppResult<()> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::internal)?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> AppResult<()> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid API_HOST/API_PORT: {e}")))?;

    let state = create_app_state(&config).await?;

    // The first joins must diff against a real listing
    populate_communities(&state, &config.tracker.communities).await;

    let app = create_app(state);
    run_server(app, addr).await
}

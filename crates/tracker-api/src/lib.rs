//! # tracker-api
//!
//! REST API server built with Axum. The gateway relay posts membership and
//! invite events; admins read and adjust the ledger.

pub mod extractors;
pub mod fetcher;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use fetcher::{DiscordFetcher, DiscordFetcherConfig};
pub use server::{create_app, create_app_state, populate_communities, run};
pub use state::AppState;

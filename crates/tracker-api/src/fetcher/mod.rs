//! Remote invite listing
//!
//! `DiscordFetcher` implements the `SnapshotFetcher` port over the Discord
//! REST API.

mod discord;

pub use discord::{DiscordFetcher, DiscordFetcherConfig};

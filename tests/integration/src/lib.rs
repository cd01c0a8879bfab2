//! Integration test utilities for the invite tracker
//!
//! Spawns the REST API on an ephemeral port with an in-memory ledger and a
//! scripted invite listing, so tests can drive joins end to end.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;

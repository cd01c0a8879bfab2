//! Route handlers
//!
//! HTTP request handlers grouped by concern: inbound platform events,
//! ledger reads and admin writes, and health checks.

pub mod events;
pub mod health;
pub mod stats;

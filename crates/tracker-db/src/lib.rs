//! # tracker-db
//!
//! Ledger persistence implementing `LedgerRepository` with PostgreSQL via SQLx,
//! plus an in-memory ledger with identical semantics.
//!
//! ## Overview
//!
//! - Connection pool management and migrations
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - `PgLedgerRepository` and `MemoryLedgerRepository`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tracker_db::{create_pool, run_migrations, DatabaseConfig, PgLedgerRepository};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::new("postgres://localhost/tracker", 10, 1)).await?;
//!     run_migrations(&pool).await?;
//!     let ledger = PgLedgerRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{MemoryLedgerRepository, PgLedgerRepository};

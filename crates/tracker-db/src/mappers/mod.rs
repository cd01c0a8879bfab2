//! Entity to model mappers
//!
//! This module provides conversions between domain entities (tracker-core) and database models.
//! - `From<Model> for Entity`: Convert database rows to domain objects
//! - `*Insert` structs: Prepare entity data for database operations

mod invite_stats;
mod usage_record;

pub use usage_record::UsageRecordInsert;

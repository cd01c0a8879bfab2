//! Axum extractors for request handling
//!
//! Custom extractors for validated bodies and snowflake path parameters.

mod path;
mod validated;

pub use path::{CommunityPath, CommunityUserPath};
pub use validated::{OptionalValidatedJson, ValidatedJson, ApiQuery};

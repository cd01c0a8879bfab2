//! Pure domain logic operating on snapshots

mod attribution;

pub use attribution::{attribute, candidate_count, uses_regressions};

//! In-memory snapshot cache

mod store;

pub use store::{SharedSnapshotStore, SnapshotStore};

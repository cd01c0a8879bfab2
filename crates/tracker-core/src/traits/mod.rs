//! Ports - traits the infrastructure layer implements

mod fetcher;
mod policy;
mod repositories;
mod sink;

pub use fetcher::{FetchError, SnapshotFetcher};
pub use policy::{FakeAccountPolicy, MinAccountAge, NeverFake};
pub use repositories::{LedgerRepository, RepoResult};
pub use sink::EventSink;

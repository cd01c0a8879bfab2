//! Repository implementations

mod error;
mod ledger;
mod memory;

pub use ledger::PgLedgerRepository;
pub use memory::MemoryLedgerRepository;

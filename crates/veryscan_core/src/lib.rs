//! Core lending logic for VeryScan.
//! This crate is the single source of truth for item lending invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::command::{Ack, CommandValidationError, ItemPatch, LendingCommand};
pub use model::item::{ItemId, ItemRecord, ItemStatus};
pub use repo::item_store::{ItemStore, StoreError, StoreResult};
pub use repo::memory_store::InMemoryItemStore;
pub use repo::sqlite_store::SqliteItemStore;
pub use service::item_locks::ItemLocks;
pub use service::lending_service::{
    Clock, ErrorKind, LendingError, LendingResult, LendingService, SystemClock, WriteStrategy,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

//! Item store contract and adapters.
//!
//! # Responsibility
//! - Define the get / atomic partial-update contract lending depends on.
//! - Isolate SQLite and in-process storage details from the lending service.
//!
//! # Invariants
//! - Every update is atomic for its field set and bumps `version` by one.
//! - Store APIs return semantic errors (`NotFound`, `VersionConflict`) in
//!   addition to transport errors.

pub mod item_store;
pub mod memory_store;
pub mod sqlite_store;

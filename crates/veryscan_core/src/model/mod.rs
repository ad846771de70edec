//! Lending domain model.
//!
//! # Responsibility
//! - Define the item record owned by the item store.
//! - Define the commands that move an item between lending states.
//!
//! # Invariants
//! - Core mutates records only through `ItemPatch` partial updates.
//! - Records are never created or deleted by core.

pub mod command;
pub mod item;

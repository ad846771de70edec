//! Core use-case services.
//!
//! # Responsibility
//! - Turn lending commands into item store calls.
//! - Keep transports (CLI, HTTP) decoupled from storage details.

pub mod item_locks;
pub mod lending_service;

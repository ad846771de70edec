//! Item store contract.
//!
//! # Responsibility
//! - Describe the external record store the lending core writes through.
//! - Provide one error vocabulary shared by every adapter.
//!
//! # Invariants
//! - `update_fields` never interleaves two values of one field set within a
//!   single call, but offers no isolation across calls.
//! - A missing record is always `NotFound`; adapters must not create rows.

use crate::db::DbError;
use crate::model::command::ItemPatch;
use crate::model::item::{ItemId, ItemRecord};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by item store adapters.
#[derive(Debug)]
pub enum StoreError {
    NotFound(ItemId),
    /// Conditional update lost against a concurrent writer.
    VersionConflict {
        id: ItemId,
        expected: u64,
        actual: u64,
    },
    Db(DbError),
    /// A persisted record could not be decoded.
    InvalidData(String),
    /// Store rejected or could not serve the call.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::VersionConflict {
                id,
                expected,
                actual,
            } => write!(
                f,
                "item {id} changed concurrently: expected version {expected}, found {actual}"
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
            Self::Unavailable(message) => write!(f, "item store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::VersionConflict { .. }
            | Self::InvalidData(_)
            | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-addressed record store holding one lending record per item.
pub trait ItemStore {
    /// Reads the full record, or `None` when the id does not resolve.
    fn get_by_id(&self, id: &ItemId) -> StoreResult<Option<ItemRecord>>;

    /// Atomically merges `patch` into the record and bumps its version.
    fn update_fields(&self, id: &ItemId, patch: &ItemPatch) -> StoreResult<()>;

    /// Like `update_fields`, but only when the stored version still equals
    /// `expected_version`.
    fn update_fields_if_version(
        &self,
        id: &ItemId,
        expected_version: u64,
        patch: &ItemPatch,
    ) -> StoreResult<()>;
}

impl<S: ItemStore + ?Sized> ItemStore for &S {
    fn get_by_id(&self, id: &ItemId) -> StoreResult<Option<ItemRecord>> {
        (**self).get_by_id(id)
    }

    fn update_fields(&self, id: &ItemId, patch: &ItemPatch) -> StoreResult<()> {
        (**self).update_fields(id, patch)
    }

    fn update_fields_if_version(
        &self,
        id: &ItemId,
        expected_version: u64,
        patch: &ItemPatch,
    ) -> StoreResult<()> {
        (**self).update_fields_if_version(id, expected_version, patch)
    }
}

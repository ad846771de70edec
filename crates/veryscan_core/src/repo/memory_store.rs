//! In-process item store.
//!
//! Thread-safe stand-in for a remote record store. Every call takes one
//! mutex, which gives the same per-call atomicity and the same lack of
//! cross-call isolation as the real collaborator.

use crate::model::command::ItemPatch;
use crate::model::item::{ItemId, ItemRecord};
use crate::repo::item_store::{ItemStore, StoreError, StoreResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    records: Mutex<HashMap<ItemId, ItemRecord>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with existing records.
    pub fn with_records(records: impl IntoIterator<Item = ItemRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: Mutex::new(records),
        }
    }

    /// Number of stored records; fails like any other call on a poisoned lock.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<ItemId, ItemRecord>>> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory item store lock poisoned".to_string()))
    }
}

impl ItemStore for InMemoryItemStore {
    fn get_by_id(&self, id: &ItemId) -> StoreResult<Option<ItemRecord>> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn update_fields(&self, id: &ItemId, patch: &ItemPatch) -> StoreResult<()> {
        let mut records = self.lock()?;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        merge_patch(record, patch)
    }

    fn update_fields_if_version(
        &self,
        id: &ItemId,
        expected_version: u64,
        patch: &ItemPatch,
    ) -> StoreResult<()> {
        let mut records = self.lock()?;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if record.version != expected_version {
            return Err(StoreError::VersionConflict {
                id: id.clone(),
                expected: expected_version,
                actual: record.version,
            });
        }
        merge_patch(record, patch)
    }
}

/// Applies `patch` and bumps the version, or leaves the record untouched when
/// the counter cannot advance.
fn merge_patch(record: &mut ItemRecord, patch: &ItemPatch) -> StoreResult<()> {
    let next_version = record.version.checked_add(1).ok_or_else(|| {
        StoreError::InvalidData(format!("version counter exhausted for {}", record.id))
    })?;
    patch.apply_to(record);
    record.version = next_version;
    Ok(())
}

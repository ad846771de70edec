//! Per-item single-writer serialization point.
//!
//! Commands on the same item id run one at a time; different ids never wait
//! on each other. Slots are dropped once no caller holds them, so the map
//! only grows with the number of items under contention.

use crate::model::item::ItemId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Slot = Arc<Mutex<()>>;

#[derive(Debug, Default)]
pub struct ItemLocks {
    slots: Mutex<HashMap<ItemId, Slot>>,
}

impl ItemLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` while holding the exclusive slot for `id`.
    ///
    /// A panic inside an earlier holder does not block later callers; the
    /// guarded value is `()`, so there is no state to repair.
    pub fn run<T>(&self, id: &ItemId, work: impl FnOnce() -> T) -> T {
        let lease = SlotLease {
            locks: self,
            id,
            slot: self.acquire_slot(id),
        };
        let _guard = lease.slot.lock().unwrap_or_else(PoisonError::into_inner);
        work()
    }

    /// Number of item ids that currently have a live slot.
    pub fn active_slots(&self) -> usize {
        self.slots_map().len()
    }

    fn acquire_slot(&self, id: &ItemId) -> Slot {
        Arc::clone(self.slots_map().entry(id.clone()).or_default())
    }

    fn slots_map(&self) -> MutexGuard<'_, HashMap<ItemId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drops the map entry for `id` when its last holder leaves, even on unwind.
struct SlotLease<'a> {
    locks: &'a ItemLocks,
    id: &'a ItemId,
    slot: Slot,
}

impl Drop for SlotLease<'_> {
    fn drop(&mut self) {
        let mut slots = self.locks.slots_map();
        // Map lock is held, so nobody can clone the slot between check and
        // remove; the map and this lease are the only remaining owners.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(self.id);
        }
    }
}

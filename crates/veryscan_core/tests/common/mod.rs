#![allow(dead_code)]

use rusqlite::{params, Connection};
use std::cell::Cell;
use veryscan_core::{ItemId, ItemPatch, ItemRecord, ItemStore, StoreError, StoreResult};

/// Fixed acceptance time used by deterministic service tests.
pub const NOW_MS: i64 = 1_760_000_000_000;

/// Inserts a pre-existing `Available` item row the way catalog tooling would.
pub fn seed_item(conn: &Connection, id: &str, display_name: &str) {
    conn.execute(
        "INSERT INTO items (id, display_name) VALUES (?1, ?2);",
        params![id, display_name],
    )
    .unwrap();
}

pub fn display_name(conn: &Connection, id: &str) -> Option<String> {
    conn.query_row(
        "SELECT display_name FROM items WHERE id = ?1;",
        [id],
        |row| row.get(0),
    )
    .unwrap()
}

/// Store wrapper counting every call that reaches the inner store.
pub struct CountingStore<S> {
    pub inner: S,
    pub reads: Cell<usize>,
    pub writes: Cell<usize>,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            reads: Cell::new(0),
            writes: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.reads.get() + self.writes.get()
    }
}

impl<S: ItemStore> ItemStore for CountingStore<S> {
    fn get_by_id(&self, id: &ItemId) -> StoreResult<Option<ItemRecord>> {
        self.reads.set(self.reads.get() + 1);
        self.inner.get_by_id(id)
    }

    fn update_fields(&self, id: &ItemId, patch: &ItemPatch) -> StoreResult<()> {
        self.writes.set(self.writes.get() + 1);
        self.inner.update_fields(id, patch)
    }

    fn update_fields_if_version(
        &self,
        id: &ItemId,
        expected_version: u64,
        patch: &ItemPatch,
    ) -> StoreResult<()> {
        self.writes.set(self.writes.get() + 1);
        self.inner.update_fields_if_version(id, expected_version, patch)
    }
}

/// Store whose every call fails as if the network were down.
pub struct UnreachableStore;

impl ItemStore for UnreachableStore {
    fn get_by_id(&self, _id: &ItemId) -> StoreResult<Option<ItemRecord>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn update_fields(&self, _id: &ItemId, _patch: &ItemPatch) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn update_fields_if_version(
        &self,
        _id: &ItemId,
        _expected_version: u64,
        _patch: &ItemPatch,
    ) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

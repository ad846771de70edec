//! SQLite-backed item store.
//!
//! # Responsibility
//! - Translate `ItemPatch` mutations into single-statement `UPDATE`s.
//! - Decode `items` rows into `ItemRecord` values.
//!
//! # Invariants
//! - Each update is exactly one SQL statement, so SQLite makes it atomic.
//! - Columns outside the patch (e.g. `display_name`) are never written.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::model::command::ItemPatch;
use crate::model::item::{ItemId, ItemRecord, ItemStatus};
use crate::repo::item_store::{ItemStore, StoreError, StoreResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    status,
    last_checked_out_by,
    last_checkout_time,
    is_flagged,
    version
FROM items";

/// Item store over the `items` table of a migrated connection.
pub struct SqliteItemStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn execute_update(
        &self,
        id: &ItemId,
        expected_version: Option<u64>,
        patch: &ItemPatch,
    ) -> StoreResult<usize> {
        let (mut sql, mut bind_values) = build_update(patch);
        bind_values.push(Value::Text(id.as_str().to_string()));

        if let Some(expected) = expected_version {
            sql.push_str(" AND version = ?");
            bind_values.push(Value::Integer(version_to_db(expected)?));
        }

        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(changed)
    }

    fn stored_version(&self, id: &ItemId) -> StoreResult<Option<u64>> {
        let raw = self
            .conn
            .query_row(
                "SELECT version FROM items WHERE id = ?1;",
                [id.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        raw.map(|value| parse_version(value, id)).transpose()
    }
}

impl ItemStore for SqliteItemStore<'_> {
    fn get_by_id(&self, id: &ItemId) -> StoreResult<Option<ItemRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(row)?));
        }

        Ok(None)
    }

    fn update_fields(&self, id: &ItemId, patch: &ItemPatch) -> StoreResult<()> {
        if self.execute_update(id, None, patch)? == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }

        Ok(())
    }

    fn update_fields_if_version(
        &self,
        id: &ItemId,
        expected_version: u64,
        patch: &ItemPatch,
    ) -> StoreResult<()> {
        if self.execute_update(id, Some(expected_version), patch)? > 0 {
            return Ok(());
        }

        // Zero rows changed: either the row is gone or another writer won.
        match self.stored_version(id)? {
            None => Err(StoreError::NotFound(id.clone())),
            Some(actual) => Err(StoreError::VersionConflict {
                id: id.clone(),
                expected: expected_version,
                actual,
            }),
        }
    }
}

fn build_update(patch: &ItemPatch) -> (String, Vec<Value>) {
    let mut assignments: Vec<&'static str> = Vec::with_capacity(6);
    let mut bind_values: Vec<Value> = Vec::with_capacity(6);

    if let Some(status) = patch.status {
        assignments.push("status = ?");
        bind_values.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(actor) = &patch.last_checked_out_by {
        assignments.push("last_checked_out_by = ?");
        bind_values.push(Value::Text(actor.clone()));
    }
    if let Some(time) = patch.last_checkout_time {
        assignments.push("last_checkout_time = ?");
        bind_values.push(Value::Integer(time));
    }
    if let Some(flagged) = patch.is_flagged {
        assignments.push("is_flagged = ?");
        bind_values.push(Value::Integer(bool_to_int(flagged)));
    }
    assignments.push("version = version + 1");
    assignments.push("updated_at = (strftime('%s', 'now') * 1000)");

    let sql = format!("UPDATE items SET {} WHERE id = ?", assignments.join(", "));
    (sql, bind_values)
}

fn parse_item_row(row: &Row<'_>) -> StoreResult<ItemRecord> {
    let id = ItemId::new(row.get::<_, String>("id")?);

    let status_text: String = row.get("status")?;
    let status = ItemStatus::parse(&status_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid status `{status_text}` in items.status"))
    })?;

    let is_flagged = match row.get::<_, i64>("is_flagged")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid is_flagged value `{other}` in items.is_flagged"
            )));
        }
    };

    let version = parse_version(row.get("version")?, &id)?;

    Ok(ItemRecord {
        id,
        status,
        last_checked_out_by: row.get("last_checked_out_by")?,
        last_checkout_time: row.get("last_checkout_time")?,
        is_flagged,
        version,
    })
}

fn parse_version(value: i64, id: &ItemId) -> StoreResult<u64> {
    u64::try_from(value).map_err(|_| {
        StoreError::InvalidData(format!("invalid version `{value}` in items.version for {id}"))
    })
}

fn version_to_db(version: u64) -> StoreResult<i64> {
    i64::try_from(version)
        .map_err(|_| StoreError::InvalidData(format!("version `{version}` exceeds storage range")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::build_update;
    use crate::model::command::LendingCommand;

    #[test]
    fn return_update_sets_status_and_bookkeeping_only() {
        let (sql, values) = build_update(&LendingCommand::return_item("a").derive_patch(1));
        assert_eq!(
            sql,
            "UPDATE items SET status = ?, version = version + 1, \
             updated_at = (strftime('%s', 'now') * 1000) WHERE id = ?"
        );
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn checkout_update_binds_all_four_fields() {
        let (sql, values) =
            build_update(&LendingCommand::checkout("a", "Kshitij").derive_patch(1));
        assert!(sql.contains("last_checked_out_by = ?"));
        assert!(sql.contains("last_checkout_time = ?"));
        assert!(sql.contains("is_flagged = ?"));
        assert!(!sql.contains("display_name"));
        assert_eq!(values.len(), 4);
    }
}

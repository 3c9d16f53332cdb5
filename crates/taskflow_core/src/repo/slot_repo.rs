//! Slot repository contracts and implementations.
//!
//! # Responsibility
//! - Read and replace whole-store payloads by slot name.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `write_slot` is an upsert; `write_count` grows by one per write.
//! - Read paths surface corrupt rows as `InvalidData` instead of masking them.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

const SLOT_SELECT_SQL: &str = "SELECT
    slot_key,
    schema_version,
    payload,
    write_count,
    updated_at
FROM store_slots";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for slot persistence and payload decoding.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Codec(serde_json::Error),
    UnsupportedSlotVersion {
        slot: StoreSlot,
        stored: u32,
        supported: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "slot payload codec error: {err}"),
            Self::UnsupportedSlotVersion {
                slot,
                stored,
                supported,
            } => write!(
                f,
                "slot `{}` has schema version {stored}, newer than supported {supported}",
                slot.key()
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted slot data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::UnsupportedSlotVersion { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value)
    }
}

/// The four durable slots, one per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreSlot {
    Tasks,
    Projects,
    Categories,
    Settings,
}

impl StoreSlot {
    pub const ALL: [StoreSlot; 4] = [
        StoreSlot::Tasks,
        StoreSlot::Projects,
        StoreSlot::Categories,
        StoreSlot::Settings,
    ];

    /// Durable slot name.
    pub fn key(self) -> &'static str {
        match self {
            Self::Tasks => "task-storage",
            Self::Projects => "project-storage",
            Self::Categories => "category-storage",
            Self::Settings => "settings-storage",
        }
    }
}

/// Raw persisted slot row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub slot: StoreSlot,
    pub schema_version: u32,
    /// JSON-encoded store state.
    pub payload: String,
    pub write_count: i64,
    /// Epoch milliseconds of the last write.
    pub updated_at: i64,
}

/// Durable storage for whole-store payloads.
pub trait SlotRepository {
    fn read_slot(&self, slot: StoreSlot) -> RepoResult<Option<SlotRecord>>;
    fn write_slot(&self, slot: StoreSlot, schema_version: u32, payload: &str) -> RepoResult<()>;
    /// Removes the slot. Returns whether a row existed.
    fn clear_slot(&self, slot: StoreSlot) -> RepoResult<bool>;
}

/// SQLite-backed slot repository over a migrated connection.
#[derive(Clone, Copy)]
pub struct SqliteSlotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSlotRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `InvalidData` when the `store_slots` table is missing, which means the
    ///   connection skipped migrations.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'store_slots'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::InvalidData(
                "store_slots table missing; open the database through open_db".to_string(),
            ));
        }
        Ok(Self { conn })
    }
}

impl SlotRepository for SqliteSlotRepository<'_> {
    fn read_slot(&self, slot: StoreSlot) -> RepoResult<Option<SlotRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("{SLOT_SELECT_SQL} WHERE slot_key = ?1;"),
                [slot.key()],
                |row| parse_slot_row(slot, row),
            )
            .optional()?;
        row.transpose()
    }

    fn write_slot(&self, slot: StoreSlot, schema_version: u32, payload: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO store_slots (slot_key, schema_version, payload, write_count, updated_at)
             VALUES (?1, ?2, ?3, 1, (strftime('%s', 'now') * 1000))
             ON CONFLICT(slot_key) DO UPDATE SET
                schema_version = excluded.schema_version,
                payload = excluded.payload,
                write_count = store_slots.write_count + 1,
                updated_at = excluded.updated_at;",
            params![slot.key(), schema_version, payload],
        )?;
        Ok(())
    }

    fn clear_slot(&self, slot: StoreSlot) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM store_slots WHERE slot_key = ?1;", [slot.key()])?;
        Ok(changed > 0)
    }
}

// Returns a nested result so column-type failures stay rusqlite errors while
// semantic failures become `InvalidData`.
fn parse_slot_row(slot: StoreSlot, row: &Row<'_>) -> rusqlite::Result<RepoResult<SlotRecord>> {
    let key: String = row.get("slot_key")?;
    if key != slot.key() {
        return Ok(Err(RepoError::InvalidData(format!(
            "slot key mismatch: expected `{}`, got `{key}`",
            slot.key()
        ))));
    }
    let schema_version: i64 = row.get("schema_version")?;
    let Ok(schema_version) = u32::try_from(schema_version) else {
        return Ok(Err(RepoError::InvalidData(format!(
            "invalid schema_version `{schema_version}` in store_slots.schema_version"
        ))));
    };

    Ok(Ok(SlotRecord {
        slot,
        schema_version,
        payload: row.get("payload")?,
        write_count: row.get("write_count")?,
        updated_at: row.get("updated_at")?,
    }))
}

/// In-memory slot repository.
///
/// Clones share the same slots, so every store of one context sees one
/// backing map. `fail_writes` simulates a storage outage.
#[derive(Debug, Clone, Default)]
pub struct MemorySlotRepository {
    slots: Rc<RefCell<BTreeMap<StoreSlot, SlotRecord>>>,
    fail_writes: Rc<Cell<bool>>,
    clock_ms: Rc<Cell<i64>>,
}

impl MemorySlotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn slot_count(&self) -> usize {
        self.slots.borrow().len()
    }
}

impl SlotRepository for MemorySlotRepository {
    fn read_slot(&self, slot: StoreSlot) -> RepoResult<Option<SlotRecord>> {
        Ok(self.slots.borrow().get(&slot).cloned())
    }

    fn write_slot(&self, slot: StoreSlot, schema_version: u32, payload: &str) -> RepoResult<()> {
        if self.fail_writes.get() {
            return Err(RepoError::InvalidData(format!(
                "simulated write failure for slot `{}`",
                slot.key()
            )));
        }
        let tick = self.clock_ms.get() + 1;
        self.clock_ms.set(tick);

        let mut slots = self.slots.borrow_mut();
        let write_count = slots.get(&slot).map_or(0, |record| record.write_count) + 1;
        slots.insert(
            slot,
            SlotRecord {
                slot,
                schema_version,
                payload: payload.to_string(),
                write_count,
                updated_at: tick,
            },
        );
        Ok(())
    }

    fn clear_slot(&self, slot: StoreSlot) -> RepoResult<bool> {
        Ok(self.slots.borrow_mut().remove(&slot).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_repository_counts_writes_and_shares_state_across_clones() {
        let repo = MemorySlotRepository::new();
        let clone = repo.clone();

        repo.write_slot(StoreSlot::Tasks, 1, "{}").unwrap();
        clone.write_slot(StoreSlot::Tasks, 1, "{\"tasks\":[]}").unwrap();

        let record = repo.read_slot(StoreSlot::Tasks).unwrap().unwrap();
        assert_eq!(record.write_count, 2);
        assert_eq!(record.payload, "{\"tasks\":[]}");
        assert_eq!(repo.slot_count(), 1);
    }

    #[test]
    fn memory_repository_can_simulate_write_failures() {
        let repo = MemorySlotRepository::new();
        repo.set_fail_writes(true);
        assert!(repo.write_slot(StoreSlot::Settings, 1, "{}").is_err());
        assert!(repo.read_slot(StoreSlot::Settings).unwrap().is_none());
    }

    #[test]
    fn slot_keys_are_distinct() {
        let keys = StoreSlot::ALL.map(StoreSlot::key);
        assert_eq!(
            keys,
            [
                "task-storage",
                "project-storage",
                "category-storage",
                "settings-storage"
            ]
        );
    }
}

//! Ordered schema steps for the `store_slots` table.
//!
//! Each step is a named SQL script. Steps run inside a single transaction, so
//! a failure in step N leaves the database at the version it had before the
//! upgrade started, and the error names the step that broke.

use crate::db::{DbError, DbResult};
use log::{debug, info, warn};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "store_slots",
        sql: include_str!("0001_store_slots.sql"),
    },
    Migration {
        version: 2,
        name: "slot_write_count",
        sql: include_str!("0002_slot_write_count.sql"),
    },
];

/// Newest schema version this build can write.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Where a database stands relative to this build, read without modifying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaStatus {
    pub current: u32,
    pub latest: u32,
}

impl SchemaStatus {
    pub fn pending(&self) -> usize {
        MIGRATIONS
            .iter()
            .filter(|migration| migration.version > self.current)
            .count()
    }

    pub fn is_newer_than_build(&self) -> bool {
        self.current > self.latest
    }
}

pub fn schema_status(conn: &Connection) -> DbResult<SchemaStatus> {
    Ok(SchemaStatus {
        current: read_user_version(conn)?,
        latest: latest_version(),
    })
}

/// Brings `conn` up to `latest_version()`.
///
/// Fails with `UnsupportedSchemaVersion` when the file was written by a newer
/// build, and with `MigrationFailed` naming the broken step otherwise.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let status = schema_status(conn)?;
    if status.is_newer_than_build() {
        warn!(
            "event=db_migrate module=db status=rejected db_version={} latest_supported={}",
            status.current, status.latest
        );
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: status.current,
            latest_supported: status.latest,
        });
    }
    if status.pending() == 0 {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > status.current)
    {
        run_step(&tx, migration)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} steps={}",
        status.current,
        status.latest,
        status.pending()
    );
    Ok(())
}

fn run_step(tx: &Transaction<'_>, migration: &Migration) -> DbResult<()> {
    tx.execute_batch(migration.sql)
        .and_then(|()| {
            tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
        })
        .map_err(|source| DbError::MigrationFailed {
            version: migration.version,
            name: migration.name,
            source,
        })?;
    debug!(
        "event=db_migrate_step module=db status=ok version={} name={}",
        migration.version, migration.name
    );
    Ok(())
}

fn read_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_contiguous_from_one() {
        for (index, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, index + 1, "{}", migration.name);
        }
    }

    #[test]
    fn fresh_connection_reports_every_step_pending() {
        let conn = Connection::open_in_memory().unwrap();
        let status = schema_status(&conn).unwrap();
        assert_eq!(status.current, 0);
        assert_eq!(status.pending(), MIGRATIONS.len());
        assert!(!status.is_newer_than_build());
    }

    #[test]
    fn failing_step_is_named_and_rolled_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        // Pre-existing column makes the write_count ALTER fail.
        conn.execute_batch(
            "CREATE TABLE store_slots (
                slot_key TEXT PRIMARY KEY NOT NULL,
                schema_version INTEGER NOT NULL,
                payload TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                write_count INTEGER NOT NULL DEFAULT 0
            );",
        )
        .unwrap();

        let err = apply_migrations(&mut conn).unwrap_err();
        assert!(matches!(
            err,
            DbError::MigrationFailed {
                version: 2,
                name: "slot_write_count",
                ..
            }
        ));
        assert_eq!(err.code(), "db_migration_failed");
        assert_eq!(schema_status(&conn).unwrap().current, 0);
    }
}

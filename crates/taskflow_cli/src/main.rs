//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `taskflow_core` linkage.
//! - Summarize a persisted database when given its path.
//!
//! Usage: `taskflow_cli [DB_PATH]`. Without an argument the database from
//! `TASKFLOW_DB_PATH` (or the temp-dir default) is summarized if it exists.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use taskflow_core::db::schema_status;
use taskflow_core::{
    open_db, system_clock, AppContext, CoreConfig, SlotRepository, SqliteSlotRepository,
    StoreSlot,
};

fn main() -> ExitCode {
    println!("taskflow_core ping={}", taskflow_core::ping());
    println!("taskflow_core version={}", taskflow_core::core_version());

    let db_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| CoreConfig::from_env().db_path);
    if !db_path.exists() {
        println!("db={} status=missing", db_path.display());
        return ExitCode::SUCCESS;
    }

    match summarize(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("db={} status=error error={message}", db_path.display());
            ExitCode::FAILURE
        }
    }
}

fn summarize(db_path: &Path) -> Result<(), String> {
    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let repo = SqliteSlotRepository::try_new(&conn).map_err(|err| err.to_string())?;

    let schema = schema_status(&conn).map_err(|err| err.to_string())?;
    println!(
        "db={} status=ok schema_version={} latest={}",
        db_path.display(),
        schema.current,
        schema.latest
    );
    for slot in StoreSlot::ALL {
        match repo.read_slot(slot).map_err(|err| err.to_string())? {
            Some(record) => println!(
                "slot={} schema_version={} write_count={} bytes={}",
                slot.key(),
                record.schema_version,
                record.write_count,
                record.payload.len()
            ),
            None => println!("slot={} status=empty", slot.key()),
        }
    }

    let app = AppContext::load(repo, system_clock()).map_err(|err| err.to_string())?;
    let open = app.tasks.incomplete_tasks().len();
    let done = app.tasks.completed_tasks().len();
    println!(
        "tasks={} open={open} completed={done} tags={} projects={} categories={}",
        app.tasks.tasks().len(),
        app.tasks.tags().len(),
        app.projects.projects().len(),
        app.categories.categories().len()
    );
    Ok(())
}

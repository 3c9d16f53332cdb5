//! Core domain logic for TaskFlow.
//! This crate is the single source of truth for task, project, category and
//! settings invariants; UI and FFI layers only call into it.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod view;

pub use clock::{system_clock, Clock, SharedClock, StepClock, SystemClock};
pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{Category, CategoryId, CategoryPatch, NewCategory};
pub use model::project::{NewProject, Project, ProjectId, ProjectPatch};
pub use model::settings::{Settings, SortBy, SortDirection};
pub use model::task::{
    NewTag, NewTask, Priority, Recurrence, RecurrenceType, Reminder, SubTask, SubtaskId,
    SubtaskPatch, Tag, TagId, TagPatch, Task, TaskId, TaskPatch,
};
pub use model::validate::ModelValidationError;
pub use repo::slot_repo::{
    MemorySlotRepository, RepoError, RepoResult, SlotRecord, SlotRepository,
    SqliteSlotRepository, StoreSlot,
};
pub use service::app_context::{
    AppContext, AppResult, AppServiceError, CategoryDeletion, ProjectDeletion,
};
pub use store::{StoreError, StoreErrorKind, StoreResult};
pub use view::task_list::{TaskFilter, TaskQuery, TaskTab};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

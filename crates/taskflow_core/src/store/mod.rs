//! In-memory stores with write-through slot persistence.
//!
//! # Responsibility
//! - Own each entity collection and expose its CRUD operations.
//! - Flush the full store state to its slot after every successful mutation.
//!
//! # Invariants
//! - In-memory state is the source of truth for reads.
//! - A failed flush is logged and never rolls back or corrupts memory state.
//! - Missing ids are reported as `*NotFound`, never silently ignored.

use crate::model::category::CategoryId;
use crate::model::project::ProjectId;
use crate::model::task::{SubtaskId, TagId, TaskId};
use crate::model::validate::ModelValidationError;
use crate::repo::slot_codec::{decode_state, encode_state, CURRENT_SLOT_VERSION};
use crate::repo::slot_repo::{RepoResult, SlotRepository, StoreSlot};
use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category_store;
pub mod project_store;
pub mod settings_store;
pub mod task_store;

pub type StoreResult<T> = Result<T, StoreError>;

/// Coarse error class so boundary layers can map errors to stable codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    NotFound,
    Invalid,
    Conflict,
}

impl StoreErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Invalid => "invalid",
            Self::Conflict => "conflict",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(ModelValidationError),
    TaskNotFound(TaskId),
    SubtaskNotFound {
        task_id: TaskId,
        subtask_id: SubtaskId,
    },
    TagNotFound(TagId),
    ProjectNotFound(ProjectId),
    CategoryNotFound(CategoryId),
    /// Default categories cannot be deleted.
    ProtectedCategory(CategoryId),
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::Validation(_) => StoreErrorKind::Invalid,
            Self::ProtectedCategory(_) => StoreErrorKind::Conflict,
            Self::TaskNotFound(_)
            | Self::SubtaskNotFound { .. }
            | Self::TagNotFound(_)
            | Self::ProjectNotFound(_)
            | Self::CategoryNotFound(_) => StoreErrorKind::NotFound,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::SubtaskNotFound {
                task_id,
                subtask_id,
            } => write!(f, "subtask {subtask_id} not found in task {task_id}"),
            Self::TagNotFound(id) => write!(f, "tag not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::ProtectedCategory(id) => {
                write!(f, "default category `{id}` cannot be deleted")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for StoreError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Binds one store to its durable slot.
pub(crate) struct SlotBinding<R> {
    repo: R,
    slot: StoreSlot,
}

impl<R: SlotRepository> SlotBinding<R> {
    pub(crate) fn new(repo: R, slot: StoreSlot) -> Self {
        Self { repo, slot }
    }

    /// Reads the slot once at startup. `None` when the slot was never written.
    pub(crate) fn load<T: DeserializeOwned>(&self) -> RepoResult<Option<T>> {
        let Some(record) = self.repo.read_slot(self.slot)? else {
            debug!(
                "event=slot_load module=store status=empty slot={}",
                self.slot.key()
            );
            return Ok(None);
        };
        let state = decode_state(&record)?;
        debug!(
            "event=slot_load module=store status=ok slot={} schema_version={} write_count={}",
            self.slot.key(),
            record.schema_version,
            record.write_count
        );
        Ok(Some(state))
    }

    pub(crate) fn flush<T: Serialize>(&self, state: &T) -> RepoResult<()> {
        let payload = encode_state(state)?;
        self.repo
            .write_slot(self.slot, CURRENT_SLOT_VERSION, &payload)
    }

    /// Write-through after a mutation. Failures are logged only; memory state
    /// stays authoritative until the next successful flush.
    pub(crate) fn flush_logged<T: Serialize>(&self, state: &T) {
        if let Err(err) = self.flush(state) {
            error!(
                "event=slot_flush module=store status=error slot={} error={}",
                self.slot.key(),
                err
            );
        }
    }
}

//! Application context: the four stores plus cross-store rules.
//!
//! # Responsibility
//! - Construct every store once, over one slot repository and one clock.
//! - Enforce referential rules the stores do not know about: project cascade
//!   delete, category reassignment, reference checks on task creation.
//!
//! # Invariants
//! - Deleting a project deletes exactly the tasks that reference it.
//! - Deleting a custom category leaves no task pointing at it.
//! - Default categories are never deleted.

use crate::clock::SharedClock;
use crate::model::category::{is_default_category_id, Category, CategoryId, FALLBACK_CATEGORY_ID};
use crate::model::project::{Project, ProjectId};
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::repo::slot_repo::{RepoResult, SlotRepository};
use crate::store::category_store::CategoryStore;
use crate::store::project_store::ProjectStore;
use crate::store::settings_store::SettingsStore;
use crate::store::task_store::TaskStore;
use crate::store::{StoreError, StoreErrorKind};
use crate::view::calendar::tasks_on;
use crate::view::task_list::{TaskFilter, TaskQuery, TaskTab};
use chrono::NaiveDate;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from application-level operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppServiceError {
    /// Store-level failure (not found, invalid, protected).
    Store(StoreError),
    /// Task references a category that does not exist.
    UnknownCategory(CategoryId),
    /// Task references a project that does not exist.
    UnknownProject(ProjectId),
}

impl AppServiceError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::Store(err) => err.kind(),
            Self::UnknownCategory(_) | Self::UnknownProject(_) => StoreErrorKind::Invalid,
        }
    }
}

impl Display for AppServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::UnknownCategory(id) => write!(f, "task references unknown category `{id}`"),
            Self::UnknownProject(id) => write!(f, "task references unknown project {id}"),
        }
    }
}

impl Error for AppServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for AppServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub type AppResult<T> = Result<T, AppServiceError>;

/// Outcome of `delete_project_cascade`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDeletion {
    pub project: Project,
    pub removed_task_ids: Vec<TaskId>,
}

/// Outcome of `delete_category_reassign`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDeletion {
    pub category: Category,
    pub reassigned_task_ids: Vec<TaskId>,
    /// Whether the default-category preference pointed at the deleted category.
    pub default_setting_reset: bool,
}

/// Explicit handle over all stores, built once at startup and passed to
/// callers.
pub struct AppContext<R: SlotRepository + Clone> {
    pub tasks: TaskStore<R>,
    pub projects: ProjectStore<R>,
    pub categories: CategoryStore<R>,
    pub settings: SettingsStore<R>,
}

impl<R: SlotRepository + Clone> AppContext<R> {
    /// Loads every slot. Absent slots start from their defaults.
    pub fn load(repo: R, clock: SharedClock) -> RepoResult<Self> {
        let context = Self {
            tasks: TaskStore::load(repo.clone(), clock.clone())?,
            projects: ProjectStore::load(repo.clone(), clock)?,
            categories: CategoryStore::load(repo.clone())?,
            settings: SettingsStore::load(repo)?,
        };
        info!(
            "event=context_load module=service status=ok tasks={} tags={} projects={} categories={}",
            context.tasks.tasks().len(),
            context.tasks.tags().len(),
            context.projects.projects().len(),
            context.categories.categories().len()
        );
        Ok(context)
    }

    /// Flushes every store, stopping at the first failure.
    pub fn flush_all(&self) -> RepoResult<()> {
        self.tasks.flush()?;
        self.projects.flush()?;
        self.categories.flush()?;
        self.settings.flush()
    }

    /// Creation payload prefilled from the default category and priority
    /// preferences.
    pub fn new_task_draft(&self, title: impl Into<String>) -> NewTask {
        let settings = self.settings.settings();
        let mut draft = NewTask::new(title);
        if self.categories.category(&settings.default_category_id).is_some() {
            draft.category_id = settings.default_category_id.clone();
        }
        draft.priority = settings.default_priority;
        draft
    }

    /// Creates a task after checking its category and project exist.
    pub fn create_task(&mut self, new_task: NewTask) -> AppResult<TaskId> {
        self.check_references(Some(&new_task.category_id), new_task.project_id)?;
        Ok(self.tasks.add_task(new_task)?)
    }

    /// Updates a task after checking any changed category or project exists.
    pub fn update_task(&mut self, task_id: TaskId, patch: TaskPatch) -> AppResult<()> {
        self.check_references(patch.category_id.as_ref(), patch.project_id.flatten())?;
        Ok(self.tasks.update_task(task_id, patch)?)
    }

    fn check_references(
        &self,
        category_id: Option<&CategoryId>,
        project_id: Option<ProjectId>,
    ) -> AppResult<()> {
        if let Some(category_id) = category_id {
            if self.categories.category(category_id).is_none() {
                return Err(AppServiceError::UnknownCategory(category_id.clone()));
            }
        }
        if let Some(project_id) = project_id {
            if self.projects.project(project_id).is_none() {
                return Err(AppServiceError::UnknownProject(project_id));
            }
        }
        Ok(())
    }

    /// Deletes a project and every task in it.
    ///
    /// Tasks go first so a crash between the two flushes leaves an empty
    /// project rather than orphaned tasks.
    pub fn delete_project_cascade(&mut self, project_id: ProjectId) -> AppResult<ProjectDeletion> {
        if self.projects.project(project_id).is_none() {
            return Err(StoreError::ProjectNotFound(project_id).into());
        }
        let removed_task_ids = self.tasks.delete_tasks_by_project(project_id);
        let project = self.projects.delete_project(project_id)?;

        info!(
            "event=project_cascade_delete module=service status=ok project_id={} removed_tasks={}",
            project_id,
            removed_task_ids.len()
        );
        Ok(ProjectDeletion {
            project,
            removed_task_ids,
        })
    }

    /// Deletes a custom category, moving its tasks to the fallback category.
    pub fn delete_category_reassign(&mut self, category_id: &str) -> AppResult<CategoryDeletion> {
        if is_default_category_id(category_id) {
            warn!(
                "event=category_delete module=service status=rejected category_id={category_id} reason=protected"
            );
            return Err(StoreError::ProtectedCategory(category_id.to_string()).into());
        }
        if self.categories.category(category_id).is_none() {
            return Err(StoreError::CategoryNotFound(category_id.to_string()).into());
        }

        let fallback = FALLBACK_CATEGORY_ID.to_string();
        let reassigned_task_ids = self.tasks.reassign_category(category_id, &fallback);
        let default_setting_reset =
            self.settings.settings().default_category_id == category_id;
        if default_setting_reset {
            self.settings.set_default_category(fallback)?;
        }
        let category = self.categories.delete_category(category_id)?;

        info!(
            "event=category_delete module=service status=ok category_id={} reassigned_tasks={}",
            category_id,
            reassigned_task_ids.len()
        );
        Ok(CategoryDeletion {
            category,
            reassigned_task_ids,
            default_setting_reset,
        })
    }

    /// Filtered and sorted list using the persisted sort preferences.
    pub fn list_tasks(
        &self,
        tab: TaskTab,
        category_id: Option<CategoryId>,
        project_id: Option<ProjectId>,
    ) -> Vec<&Task> {
        let filter = TaskFilter {
            tab,
            category_id,
            project_id,
        };
        TaskQuery::from_settings(self.settings.settings(), filter).run(self.tasks.tasks())
    }

    /// Calendar list for one day, in store order.
    pub fn tasks_for_day(&self, day: NaiveDate) -> Vec<&Task> {
        tasks_on(self.tasks.tasks(), day)
    }
}

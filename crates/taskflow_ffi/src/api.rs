//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose task, project, category and settings use cases to Dart via FRB.
//! - Translate ids and optional fields from strings into core types.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every call loads the slots, runs one use case and confirms the flush
//!   before reporting success.
//! - Calls are serialized per process so two calls never interleave their
//!   load/flush cycles.

use chrono::{NaiveDate, Utc};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use taskflow_core::model::validate::{parse_day, parse_timestamp};
use taskflow_core::view::summary::{is_overdue, subtask_progress};
use taskflow_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, open_db,
    ping as ping_inner, system_clock, AppContext, AppServiceError, CoreConfig, DbError,
    NewCategory, NewProject, NewTag, Priority, RepoError, SortBy, SortDirection,
    SqliteSlotRepository, StoreError, Task, TaskPatch, TaskTab,
};
use uuid::Uuid;

static APP_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static APP_CALL_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created or affected entity.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    /// Stable failure class: `not_found|invalid|conflict|storage`.
    pub error_code: Option<String>,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: impl ToString) -> Self {
        Self {
            ok: true,
            id: Some(id.to_string()),
            message: message.into(),
            error_code: None,
        }
    }

    fn failure(op: &str, err: CallError) -> Self {
        Self {
            ok: false,
            id: None,
            message: format!("{op} failed: {}", err.message),
            error_code: Some(err.code.to_string()),
        }
    }
}

/// Flat task row for list and calendar screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    pub completed: bool,
    /// RFC 3339 due timestamp.
    pub due_date: Option<String>,
    pub category_id: String,
    pub priority: String,
    pub project_id: Option<String>,
    pub tag_names: Vec<String>,
    pub subtasks_completed: u32,
    pub subtasks_total: u32,
    pub overdue: bool,
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub items: Vec<TaskItem>,
    pub message: String,
}

impl TaskListResponse {
    fn from_result(op: &str, result: Result<Vec<TaskItem>, CallError>) -> Self {
        match result {
            Ok(items) => {
                let message = if items.is_empty() {
                    "No tasks.".to_string()
                } else {
                    format!("Found {} task(s).", items.len())
                };
                Self { items, message }
            }
            Err(err) => Self {
                items: Vec::new(),
                message: format!("{op} failed: {}", err.message),
            },
        }
    }
}

/// Creates a task. Omitted category and priority fall back to the settings
/// defaults.
///
/// `due_date` accepts RFC 3339 or `YYYY-MM-DD`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_create(
    title: String,
    category_id: Option<String>,
    priority: Option<String>,
    due_date: Option<String>,
    project_id: Option<String>,
) -> ActionResponse {
    let result = with_app(|app| {
        let mut draft = app.new_task_draft(title.trim());
        if let Some(category_id) = non_blank(category_id) {
            draft.category_id = category_id;
        }
        if let Some(priority) = non_blank(priority) {
            draft.priority = Priority::parse(&priority);
        }
        if let Some(due_date) = non_blank(due_date) {
            draft.due_date = Some(parse_timestamp(&due_date).map_err(StoreError::from)?);
        }
        if let Some(project_id) = non_blank(project_id) {
            draft.project_id = Some(parse_id("project_id", &project_id)?);
        }
        Ok(app.create_task(draft)?)
    });
    respond("task_create", "Task created.", result)
}

/// Updates the editable task fields. `None` leaves a field unchanged;
/// `clear_due_date` removes the due date.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update(
    task_id: String,
    title: Option<String>,
    description: Option<String>,
    due_date: Option<String>,
    clear_due_date: bool,
    priority: Option<String>,
    category_id: Option<String>,
) -> ActionResponse {
    let result = with_app(|app| {
        let task_id = parse_id("task_id", &task_id)?;
        let mut patch = TaskPatch {
            title: title.map(|value| value.trim().to_string()),
            description: description.map(|value| non_blank(Some(value))),
            priority: non_blank(priority).map(|value| Priority::parse(&value)),
            category_id: non_blank(category_id),
            ..TaskPatch::default()
        };
        if clear_due_date {
            patch.due_date = Some(None);
        } else if let Some(due_date) = non_blank(due_date) {
            patch.due_date = Some(Some(
                parse_timestamp(&due_date).map_err(StoreError::from)?,
            ));
        }
        app.update_task(task_id, patch)?;
        Ok(task_id)
    });
    respond("task_update", "Task updated.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(task_id: String) -> ActionResponse {
    let result = with_app(|app| {
        let task_id = parse_id("task_id", &task_id)?;
        let completed = app.tasks.toggle_task_completion(task_id)?;
        Ok((task_id, completed))
    });
    match result {
        Ok((task_id, true)) => ActionResponse::success("Task completed.", task_id),
        Ok((task_id, false)) => ActionResponse::success("Task reopened.", task_id),
        Err(err) => ActionResponse::failure("task_toggle", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(task_id: String) -> ActionResponse {
    let result = with_app(|app| {
        let task_id = parse_id("task_id", &task_id)?;
        app.tasks.delete_task(task_id)?;
        Ok(task_id)
    });
    respond("task_delete", "Task deleted.", result)
}

/// Lists tasks for the `all` or `completed` tab using the persisted sort
/// preferences.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list(
    tab: String,
    category_id: Option<String>,
    project_id: Option<String>,
) -> TaskListResponse {
    let result = with_app(|app| {
        let tab = parse_tab(&tab)?;
        let project_id = non_blank(project_id)
            .map(|raw| parse_id("project_id", &raw))
            .transpose()?;
        let items: Vec<TaskItem> = app
            .list_tasks(tab, non_blank(category_id), project_id)
            .into_iter()
            .map(|task| to_task_item(app, task))
            .collect();
        Ok(items)
    });
    TaskListResponse::from_result("task_list", result)
}

/// Tasks due on `day` (`YYYY-MM-DD`).
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_for_day(day: String) -> TaskListResponse {
    let result = with_app(|app| {
        let day: NaiveDate = parse_day(&day).map_err(StoreError::from)?;
        let items: Vec<TaskItem> = app
            .tasks_for_day(day)
            .into_iter()
            .map(|task| to_task_item(app, task))
            .collect();
        Ok(items)
    });
    TaskListResponse::from_result("tasks_for_day", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn subtask_add(task_id: String, title: String) -> ActionResponse {
    let result = with_app(|app| {
        let task_id = parse_id("task_id", &task_id)?;
        Ok(app.tasks.add_subtask(task_id, title.trim())?)
    });
    respond("subtask_add", "Subtask added.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn subtask_toggle(task_id: String, subtask_id: String) -> ActionResponse {
    let result = with_app(|app| {
        let task_id = parse_id("task_id", &task_id)?;
        let subtask_id = parse_id("subtask_id", &subtask_id)?;
        app.tasks.toggle_subtask_completion(task_id, subtask_id)?;
        Ok(subtask_id)
    });
    respond("subtask_toggle", "Subtask toggled.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn subtask_delete(task_id: String, subtask_id: String) -> ActionResponse {
    let result = with_app(|app| {
        let task_id = parse_id("task_id", &task_id)?;
        let subtask_id = parse_id("subtask_id", &subtask_id)?;
        app.tasks.delete_subtask(task_id, subtask_id)?;
        Ok(subtask_id)
    });
    respond("subtask_delete", "Subtask deleted.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn tag_create(name: String, color: String) -> ActionResponse {
    let result = with_app(|app| Ok(app.tasks.add_tag(NewTag::new(name.trim(), color.trim()))?));
    respond("tag_create", "Tag created.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn tag_assign(task_id: String, tag_id: String) -> ActionResponse {
    let result = with_app(|app| {
        let task_id = parse_id("task_id", &task_id)?;
        let tag_id = parse_id("tag_id", &tag_id)?;
        app.tasks.assign_tag(task_id, tag_id)?;
        Ok(tag_id)
    });
    respond("tag_assign", "Tag assigned.", result)
}

/// Deletes a tag and removes it from every task.
#[flutter_rust_bridge::frb(sync)]
pub fn tag_delete(tag_id: String) -> ActionResponse {
    let result = with_app(|app| {
        let tag_id = parse_id("tag_id", &tag_id)?;
        app.tasks.delete_tag(tag_id)?;
        Ok(tag_id)
    });
    respond("tag_delete", "Tag deleted.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn project_create(name: String, color: String, description: Option<String>) -> ActionResponse {
    let result = with_app(|app| {
        let mut new_project = NewProject::new(name.trim(), color.trim());
        new_project.description = non_blank(description);
        Ok(app.projects.add_project(new_project)?)
    });
    respond("project_create", "Project created.", result)
}

/// Deletes a project together with its tasks.
#[flutter_rust_bridge::frb(sync)]
pub fn project_delete(project_id: String) -> ActionResponse {
    let result = with_app(|app| {
        let project_id = parse_id("project_id", &project_id)?;
        Ok(app.delete_project_cascade(project_id)?)
    });
    match result {
        Ok(deletion) => ActionResponse::success(
            format!(
                "Project deleted with {} task(s).",
                deletion.removed_task_ids.len()
            ),
            deletion.project.id,
        ),
        Err(err) => ActionResponse::failure("project_delete", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn category_create(name: String, color: String, icon: String) -> ActionResponse {
    let result = with_app(|app| {
        Ok(app
            .categories
            .add_category(NewCategory::new(name.trim(), color.trim(), icon.trim()))?)
    });
    respond("category_create", "Category created.", result)
}

/// Deletes a custom category and moves its tasks to the fallback category.
#[flutter_rust_bridge::frb(sync)]
pub fn category_delete(category_id: String) -> ActionResponse {
    let result = with_app(|app| Ok(app.delete_category_reassign(category_id.trim())?));
    match result {
        Ok(deletion) => ActionResponse::success(
            format!(
                "Category deleted; {} task(s) reassigned.",
                deletion.reassigned_task_ids.len()
            ),
            deletion.category.id,
        ),
        Err(err) => ActionResponse::failure("category_delete", err),
    }
}

/// Flips the show-completed preference. The response id is the new value.
#[flutter_rust_bridge::frb(sync)]
pub fn settings_toggle_show_completed() -> ActionResponse {
    let result = with_app(|app| Ok(app.settings.toggle_show_completed_tasks()));
    respond("settings_toggle_show_completed", "Setting updated.", result)
}

/// Sets the list sort key (`dueDate|priority|createdAt`) and direction
/// (`asc|desc`).
#[flutter_rust_bridge::frb(sync)]
pub fn settings_set_sort(sort_by: String, direction: String) -> ActionResponse {
    let result = with_app(|app| {
        let sort_by = SortBy::parse(&sort_by)
            .ok_or_else(|| CallError::invalid(format!("unsupported sort_by `{sort_by}`")))?;
        let direction = SortDirection::parse(&direction)
            .ok_or_else(|| CallError::invalid(format!("unsupported direction `{direction}`")))?;
        app.settings.set_sort_by(sort_by);
        app.settings.set_sort_direction(direction);
        Ok("sort")
    });
    respond("settings_set_sort", "Sort updated.", result)
}

struct CallError {
    code: &'static str,
    message: String,
}

impl CallError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: "invalid",
            message: message.into(),
        }
    }

    fn storage(message: impl Into<String>) -> Self {
        Self {
            code: "storage",
            message: message.into(),
        }
    }
}

impl From<AppServiceError> for CallError {
    fn from(value: AppServiceError) -> Self {
        Self {
            code: value.kind().code(),
            message: value.to_string(),
        }
    }
}

impl From<StoreError> for CallError {
    fn from(value: StoreError) -> Self {
        AppServiceError::from(value).into()
    }
}

impl From<RepoError> for CallError {
    fn from(value: RepoError) -> Self {
        Self::storage(value.to_string())
    }
}

impl From<DbError> for CallError {
    fn from(value: DbError) -> Self {
        Self::storage(value.to_string())
    }
}

fn respond<T: ToString>(op: &str, message: &str, result: Result<T, CallError>) -> ActionResponse {
    match result {
        Ok(id) => ActionResponse::success(message, id),
        Err(err) => ActionResponse::failure(op, err),
    }
}

fn resolve_app_db_path() -> PathBuf {
    APP_DB_PATH
        .get_or_init(|| CoreConfig::from_env().db_path)
        .clone()
}

fn with_app<T>(
    f: impl FnOnce(&mut AppContext<SqliteSlotRepository<'_>>) -> Result<T, CallError>,
) -> Result<T, CallError> {
    let _guard = APP_CALL_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let conn = open_db(resolve_app_db_path())?;
    let repo = SqliteSlotRepository::try_new(&conn)?;
    let mut app = AppContext::load(repo, system_clock())?;
    let value = f(&mut app).inspect_err(|err| {
        warn!(
            "event=ffi_call module=ffi status=error error_code={}",
            err.code
        );
    })?;
    app.flush_all()?;
    Ok(value)
}

fn to_task_item(app: &AppContext<SqliteSlotRepository<'_>>, task: &Task) -> TaskItem {
    let progress = subtask_progress(task);
    TaskItem {
        id: task.id.to_string(),
        title: task.title.clone(),
        completed: task.completed,
        due_date: task.due_date.map(|due| due.to_rfc3339()),
        category_id: task.category_id.clone(),
        priority: task.priority.id().to_string(),
        project_id: task.project_id.map(|id| id.to_string()),
        tag_names: app
            .tasks
            .resolve_tags(task)
            .into_iter()
            .map(|tag| tag.name.clone())
            .collect(),
        subtasks_completed: u32::try_from(progress.completed).unwrap_or(u32::MAX),
        subtasks_total: u32::try_from(progress.total).unwrap_or(u32::MAX),
        overdue: is_overdue(task, Utc::now()),
    }
}

fn parse_id(field: &str, raw: &str) -> Result<Uuid, CallError> {
    Uuid::parse_str(raw.trim()).map_err(|_| CallError::invalid(format!("invalid {field} `{raw}`")))
}

fn parse_tab(raw: &str) -> Result<TaskTab, CallError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "all" => Ok(TaskTab::All),
        "completed" => Ok(TaskTab::Completed),
        other => Err(CallError::invalid(format!("unsupported tab `{other}`"))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

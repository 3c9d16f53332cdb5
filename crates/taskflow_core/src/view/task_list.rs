//! Task list filtering and sorting.

use crate::model::category::CategoryId;
use crate::model::project::ProjectId;
use crate::model::settings::{Settings, SortBy, SortDirection};
use crate::model::task::Task;
use std::cmp::Ordering;

/// Completion tab selected on the list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskTab {
    /// Open work only; completed tasks are hidden.
    #[default]
    All,
    /// Completed tasks only, most recently updated first.
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub tab: TaskTab,
    pub category_id: Option<CategoryId>,
    pub project_id: Option<ProjectId>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let tab_matches = match self.tab {
            TaskTab::All => !task.completed,
            TaskTab::Completed => task.completed,
        };
        tab_matches
            && self
                .category_id
                .as_ref()
                .map_or(true, |category_id| &task.category_id == category_id)
            && self
                .project_id
                .map_or(true, |project_id| task.project_id == Some(project_id))
    }
}

/// Filter plus sort options for one list render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub filter: TaskFilter,
    pub sort_by: SortBy,
    pub direction: SortDirection,
}

impl TaskQuery {
    /// Query using the persisted sort preferences.
    pub fn from_settings(settings: &Settings, filter: TaskFilter) -> Self {
        Self {
            filter,
            sort_by: settings.sort_by,
            direction: settings.sort_direction,
        }
    }

    /// Filters then sorts `tasks`.
    pub fn run<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> Vec<&'a Task> {
        let mut selected = tasks
            .into_iter()
            .filter(|task| self.filter.matches(task))
            .collect::<Vec<_>>();
        sort_tasks(&mut selected, self.sort_by, self.direction, self.filter.tab);
        selected
    }
}

/// Sorts in place.
///
/// - `DueDate`: undated tasks always go last, whatever the direction.
/// - `Priority`: highest value first for `Asc`; `Desc` inverts.
/// - `CreatedAt`: newest first for `Asc`; `Desc` inverts.
/// - The completed tab overrides the key with `updated_at` descending.
pub fn sort_tasks(tasks: &mut [&Task], sort_by: SortBy, direction: SortDirection, tab: TaskTab) {
    if tab == TaskTab::Completed {
        tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        return;
    }
    tasks.sort_by(|a, b| compare_tasks(a, b, sort_by, direction));
}

fn compare_tasks(a: &Task, b: &Task, sort_by: SortBy, direction: SortDirection) -> Ordering {
    match sort_by {
        SortBy::DueDate => match (a.due_date, b.due_date) {
            (Some(a_due), Some(b_due)) => direction.apply(a_due.cmp(&b_due)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortBy::Priority => {
            direction.apply(b.priority.sort_value().cmp(&a.priority.sort_value()))
        }
        SortBy::CreatedAt => direction.apply(b.created_at.cmp(&a.created_at)),
    }
}

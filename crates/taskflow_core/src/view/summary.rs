//! Presentation summaries for task rows, project cards and category lists.

use crate::model::category::CategoryId;
use crate::model::project::ProjectId;
use crate::model::task::{Task, TaskId};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Completed vs. total counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn is_done(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Relative label for a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueLabel {
    Today,
    Tomorrow,
    On(NaiveDate),
}

/// Incomplete and due strictly before `now`.
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    !task.completed && task.due_date.is_some_and(|due| due < now)
}

pub fn due_label(due: DateTime<Utc>, today: NaiveDate) -> DueLabel {
    let day = due.date_naive();
    if day == today {
        DueLabel::Today
    } else if today.succ_opt() == Some(day) {
        DueLabel::Tomorrow
    } else {
        DueLabel::On(day)
    }
}

pub fn subtask_progress(task: &Task) -> Progress {
    Progress {
        completed: task
            .subtasks
            .iter()
            .filter(|subtask| subtask.completed)
            .count(),
        total: task.subtasks.len(),
    }
}

pub fn project_progress<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    project_id: ProjectId,
) -> Progress {
    tasks
        .into_iter()
        .filter(|task| task.project_id == Some(project_id))
        .fold(Progress::default(), |mut progress, task| {
            progress.total += 1;
            if task.completed {
                progress.completed += 1;
            }
            progress
        })
}

/// Number of tasks per category id. Categories without tasks are absent.
pub fn category_task_counts<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
) -> BTreeMap<CategoryId, usize> {
    let mut counts = BTreeMap::new();
    for task in tasks {
        *counts.entry(task.category_id.clone()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpcomingReminder {
    pub task_id: TaskId,
    pub fires_at: DateTime<Utc>,
}

/// Enabled reminders of incomplete tasks firing in `[now, now + window]`,
/// earliest first. The window saturates at the latest representable instant.
pub fn upcoming_reminders<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    now: DateTime<Utc>,
    window: Duration,
) -> Vec<UpcomingReminder> {
    let horizon = now
        .checked_add_signed(window)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let mut upcoming = tasks
        .into_iter()
        .filter(|task| !task.completed)
        .filter_map(|task| {
            let reminder = task.reminder.filter(|reminder| reminder.enabled)?;
            let fires_at = reminder.trigger_at();
            (now..=horizon).contains(&fires_at).then_some(UpcomingReminder {
                task_id: task.id,
                fires_at,
            })
        })
        .collect::<Vec<_>>();
    upcoming.sort_by_key(|reminder| reminder.fires_at);
    upcoming
}

//! Month grid and per-day grouping for the calendar screen.

use crate::model::task::Task;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Cells of a month view: Sunday-first leading blanks, then each day.
///
/// Returns an empty grid for an invalid `month`.
pub fn month_grid(year: i32, month: u32) -> Vec<Option<NaiveDate>> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let leading = first.weekday().num_days_from_sunday() as usize;
    let mut cells = vec![None; leading];
    cells.extend(
        first
            .iter_days()
            .take_while(|day| day.month() == month)
            .map(Some),
    );
    cells
}

/// Days of the given month on which at least one task is due.
pub fn days_with_tasks<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    year: i32,
    month: u32,
) -> BTreeSet<NaiveDate> {
    tasks
        .into_iter()
        .filter_map(|task| task.due_date.map(|due| due.date_naive()))
        .filter(|day| day.year() == year && day.month() == month)
        .collect()
}

/// Tasks due on `day`, in store order.
pub fn tasks_on<'a>(tasks: impl IntoIterator<Item = &'a Task>, day: NaiveDate) -> Vec<&'a Task> {
    tasks
        .into_iter()
        .filter(|task| task.is_due_on(day))
        .collect()
}

//! Derived, read-only projections over the task collection.
//!
//! # Responsibility
//! - Filter and sort task lists for list screens.
//! - Group tasks by calendar day for the calendar screen.
//! - Compute per-task and per-project presentation summaries.
//!
//! # Invariants
//! - Views never mutate or persist anything; they borrow store state.
//! - Sorting is stable: equal keys keep store (insertion) order.

pub mod calendar;
pub mod summary;
pub mod task_list;

//! User display preferences.

use crate::model::category::{CategoryId, FALLBACK_CATEGORY_ID};
use crate::model::task::Priority;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort key for task lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    DueDate,
    Priority,
    CreatedAt,
}

impl SortBy {
    /// Parses the persisted camelCase id (`dueDate`, `priority`, `createdAt`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "dueDate" => Some(Self::DueDate),
            "priority" => Some(Self::Priority),
            "createdAt" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Applies this direction to a comparison computed for `Asc`.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Singleton preferences record persisted in `settings-storage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub show_completed_tasks: bool,
    pub default_category_id: CategoryId,
    #[serde(rename = "defaultPriorityId")]
    pub default_priority: Priority,
    pub sort_by: SortBy,
    pub sort_direction: SortDirection,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_completed_tasks: true,
            default_category_id: FALLBACK_CATEGORY_ID.to_string(),
            default_priority: Priority::Medium,
            sort_by: SortBy::DueDate,
            sort_direction: SortDirection::Asc,
        }
    }
}

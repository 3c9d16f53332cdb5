//! Task, subtask and tag records.
//!
//! # Responsibility
//! - Define the task record persisted in the `task-storage` slot.
//! - Define creation/update payloads for tasks, subtasks and tags.
//!
//! # Invariants
//! - `updated_at >= created_at`, and `updated_at` never moves backwards.
//! - Subtasks are owned by exactly one task.
//! - Tasks reference tags by id only; tag data lives in the tag registry.

use crate::model::category::{CategoryId, FALLBACK_CATEGORY_ID};
use crate::model::project::ProjectId;
use crate::model::validate::{
    format_reminder_time, parse_reminder_time, require_name, require_title, validate_color,
    ModelValidationError,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;
pub type SubtaskId = Uuid;
pub type TagId = Uuid;

/// Fixed priority enumeration.
///
/// Persisted as its lowercase id. Values that are not a known id load as
/// `Unknown` instead of failing the whole slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
    Unknown,
}

impl Priority {
    /// Selectable priorities in display order.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Unknown,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }

    /// Sort weight: high=3, medium=2, low=1, unknown=0.
    pub fn sort_value(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Unknown => 0,
        }
    }

    /// Display name. Unknown priorities render as medium.
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium | Self::Unknown => "Medium",
            Self::Low => "Low",
        }
    }

    /// Badge color. Unknown priorities render as medium.
    pub fn color(self) -> &'static str {
        match self {
            Self::High => "#F44336",
            Self::Medium | Self::Unknown => "#FFC107",
            Self::Low => "#4CAF50",
        }
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        value.id().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Recurrence {
    #[serde(rename = "type")]
    pub kind: RecurrenceType,
    pub enabled: bool,
}

impl Recurrence {
    pub fn is_active(&self) -> bool {
        self.enabled && self.kind != RecurrenceType::None
    }
}

/// Reminder attached to a task: a day plus a wall-clock `HH:MM` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub date: DateTime<Utc>,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub enabled: bool,
}

impl Reminder {
    /// Instant the reminder fires: the UTC day of `date` at `time`.
    pub fn trigger_at(&self) -> DateTime<Utc> {
        self.date.date_naive().and_time(self.time).and_utc()
    }
}

mod hhmm {
    use super::{format_reminder_time, parse_reminder_time};
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_reminder_time(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_reminder_time(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub id: SubtaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial update for one subtask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl SubtaskPatch {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if let Some(title) = &self.title {
            require_title(title)?;
        }
        Ok(())
    }

    pub(crate) fn apply_to(self, subtask: &mut SubTask) {
        if let Some(title) = self.title {
            subtask.title = title;
        }
        if let Some(completed) = self.completed {
            subtask.completed = completed;
        }
    }
}

/// Registry entry for a user-defined label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
    pub color: String,
}

impl NewTag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_name(&self.name)?;
        validate_color(&self.color)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl TagPatch {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if let Some(name) = &self.name {
            require_name(name)?;
        }
        if let Some(color) = &self.color {
            validate_color(color)?;
        }
        Ok(())
    }

    pub(crate) fn apply_to(self, tag: &mut Tag) {
        if let Some(name) = self.name {
            tag.name = name;
        }
        if let Some(color) = self.color {
            tag.color = color;
        }
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub category_id: CategoryId,
    #[serde(rename = "priorityId", default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<Reminder>,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub subtasks: Vec<SubTask>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether the due date falls on `day` (UTC calendar day).
    pub fn is_due_on(&self, day: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due.date_naive() == day)
    }

    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tag_ids.contains(&tag_id)
    }

    pub fn subtask(&self, subtask_id: SubtaskId) -> Option<&SubTask> {
        self.subtasks.iter().find(|subtask| subtask.id == subtask_id)
    }

    pub(crate) fn subtask_mut(&mut self, subtask_id: SubtaskId) -> Option<&mut SubTask> {
        self.subtasks
            .iter_mut()
            .find(|subtask| subtask.id == subtask_id)
    }

    /// Refreshes `updated_at`, never moving it backwards.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

/// Creation payload for `TaskStore::add_task`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub category_id: CategoryId,
    pub priority: Priority,
    pub project_id: Option<ProjectId>,
    pub tag_ids: Vec<TagId>,
    pub reminder: Option<Reminder>,
    pub recurrence: Recurrence,
    /// Titles of subtasks created together with the task.
    pub subtask_titles: Vec<String>,
}

impl NewTask {
    /// Creates a payload in the fallback category with medium priority.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            completed: false,
            due_date: None,
            category_id: FALLBACK_CATEGORY_ID.to_string(),
            priority: Priority::default(),
            project_id: None,
            tag_ids: Vec::new(),
            reminder: None,
            recurrence: Recurrence::default(),
            subtask_titles: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_title(&self.title)?;
        if self.category_id.trim().is_empty() {
            return Err(ModelValidationError::BlankCategoryId);
        }
        for title in &self.subtask_titles {
            require_title(title)?;
        }
        Ok(())
    }
}

/// Partial task update. `Option<Option<T>>` fields distinguish "leave as is"
/// (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub category_id: Option<CategoryId>,
    pub priority: Option<Priority>,
    pub project_id: Option<Option<ProjectId>>,
    pub tag_ids: Option<Vec<TagId>>,
    pub reminder: Option<Option<Reminder>>,
    pub recurrence: Option<Recurrence>,
}

impl TaskPatch {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if let Some(title) = &self.title {
            require_title(title)?;
        }
        if let Some(category_id) = &self.category_id {
            if category_id.trim().is_empty() {
                return Err(ModelValidationError::BlankCategoryId);
            }
        }
        Ok(())
    }

    pub(crate) fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(category_id) = self.category_id {
            task.category_id = category_id;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(project_id) = self.project_id {
            task.project_id = project_id;
        }
        if let Some(tag_ids) = self.tag_ids {
            task.tag_ids = dedup_preserving_order(tag_ids);
        }
        if let Some(reminder) = self.reminder {
            task.reminder = reminder;
        }
        if let Some(recurrence) = self.recurrence {
            task.recurrence = recurrence;
        }
    }
}

pub(crate) fn dedup_preserving_order(ids: Vec<TagId>) -> Vec<TagId> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn priority_round_trips_known_ids_and_tolerates_unknown() {
        let json = serde_json::to_string(&Priority::High).expect("serialize priority");
        assert_eq!(json, "\"high\"");

        let unknown: Priority = serde_json::from_str("\"urgent\"").expect("unknown loads");
        assert_eq!(unknown, Priority::Unknown);
        assert_eq!(unknown.sort_value(), 0);
        assert_eq!(unknown.label(), "Medium");
    }

    #[test]
    fn task_deserializes_with_missing_nested_collections() {
        let raw = r#"{
            "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "title": "Pay rent",
            "categoryId": "finance",
            "priorityId": "high",
            "createdAt": "2024-03-01T10:00:00.000Z",
            "updatedAt": "2024-03-01T10:00:00.000Z"
        }"#;
        let task: Task = serde_json::from_str(raw).expect("task should deserialize");
        assert!(task.tag_ids.is_empty());
        assert!(task.subtasks.is_empty());
        assert_eq!(task.recurrence, Recurrence::default());
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn reminder_persists_time_as_hh_mm_and_triggers_on_its_day() {
        let reminder = Reminder {
            date: Utc.with_ymd_and_hms(2024, 5, 2, 23, 0, 0).unwrap(),
            time: NaiveTime::from_hms_opt(7, 45, 0).unwrap(),
            enabled: true,
        };
        let json = serde_json::to_value(reminder).expect("serialize reminder");
        assert_eq!(json["time"], "07:45");
        assert_eq!(
            reminder.trigger_at(),
            Utc.with_ymd_and_hms(2024, 5, 2, 7, 45, 0).unwrap()
        );
    }

    #[test]
    fn new_task_rejects_blank_title_and_blank_subtasks() {
        assert_eq!(
            NewTask::new("   ").validate(),
            Err(ModelValidationError::BlankTitle)
        );

        let mut task = NewTask::new("Groceries");
        task.subtask_titles = vec!["milk".to_string(), " ".to_string()];
        assert_eq!(task.validate(), Err(ModelValidationError::BlankTitle));
    }

    #[test]
    fn patch_can_clear_optional_fields() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut task = Task {
            id: Uuid::new_v4(),
            title: "Draft".to_string(),
            description: Some("notes".to_string()),
            completed: false,
            due_date: Some(now),
            category_id: "work".to_string(),
            priority: Priority::Low,
            project_id: None,
            tag_ids: Vec::new(),
            reminder: None,
            recurrence: Recurrence::default(),
            subtasks: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        TaskPatch {
            description: Some(None),
            due_date: Some(None),
            priority: Some(Priority::High),
            ..TaskPatch::default()
        }
        .apply_to(&mut task);

        assert_eq!(task.description, None);
        assert_eq!(task.due_date, None);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.title, "Draft");
    }
}

//! Task store: tasks, their subtasks, and the tag registry.
//!
//! # Responsibility
//! - CRUD over tasks and subtasks, plus the global tag registry.
//! - Read filters consumed by list and calendar views.
//!
//! # Invariants
//! - `created_at == updated_at` at creation; every task or subtask mutation
//!   refreshes `updated_at` without moving it backwards.
//! - Task order is insertion order; deletes never reorder survivors.
//! - Tasks only hold tag ids that exist in the registry at write time.
//!   Deleting a tag prunes its id from every task.

use crate::clock::SharedClock;
use crate::model::category::CategoryId;
use crate::model::project::ProjectId;
use crate::model::task::{
    dedup_preserving_order, NewTag, NewTask, SubTask, SubtaskId, SubtaskPatch, Tag, TagId,
    TagPatch, Task, TaskId, TaskPatch,
};
use crate::model::validate::require_title;
use crate::repo::slot_repo::{RepoResult, SlotRepository, StoreSlot};
use crate::store::{SlotBinding, StoreError, StoreResult};
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted shape of the `task-storage` slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStoreState {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

pub struct TaskStore<R: SlotRepository> {
    state: TaskStoreState,
    binding: SlotBinding<R>,
    clock: SharedClock,
}

impl<R: SlotRepository> TaskStore<R> {
    /// Loads the store from its slot, starting empty when the slot is absent.
    pub fn load(repo: R, clock: SharedClock) -> RepoResult<Self> {
        let binding = SlotBinding::new(repo, StoreSlot::Tasks);
        let state = binding.load()?.unwrap_or_default();
        Ok(Self {
            state,
            binding,
            clock,
        })
    }

    /// Writes the current state and reports the outcome.
    pub fn flush(&self) -> RepoResult<()> {
        self.binding.flush(&self.state)
    }

    pub fn state(&self) -> &TaskStoreState {
        &self.state
    }

    fn commit(&self) {
        self.binding.flush_logged(&self.state);
    }

    // ---- tasks -------------------------------------------------------------

    /// Creates a task and returns its generated id.
    pub fn add_task(&mut self, new_task: NewTask) -> StoreResult<TaskId> {
        new_task.validate()?;
        self.ensure_tags_exist(&new_task.tag_ids)?;

        let now = self.clock.now();
        let subtasks = new_task
            .subtask_titles
            .into_iter()
            .map(|title| SubTask {
                id: Uuid::new_v4(),
                title,
                completed: false,
                created_at: now,
            })
            .collect();
        let task = Task {
            id: Uuid::new_v4(),
            title: new_task.title,
            description: new_task.description,
            completed: new_task.completed,
            due_date: new_task.due_date,
            category_id: new_task.category_id,
            priority: new_task.priority,
            project_id: new_task.project_id,
            tag_ids: dedup_preserving_order(new_task.tag_ids),
            reminder: new_task.reminder,
            recurrence: new_task.recurrence,
            subtasks,
            created_at: now,
            updated_at: now,
        };
        let task_id = task.id;
        self.state.tasks.push(task);
        self.commit();

        info!("event=task_create module=task_store status=ok task_id={task_id}");
        Ok(task_id)
    }

    /// Merges the present patch fields into the task and refreshes `updated_at`.
    pub fn update_task(&mut self, task_id: TaskId, patch: TaskPatch) -> StoreResult<()> {
        patch.validate()?;
        if let Some(tag_ids) = &patch.tag_ids {
            self.ensure_tags_exist(tag_ids)?;
        }

        let now = self.clock.now();
        let task = self.task_mut(task_id)?;
        patch.apply_to(task);
        task.touch(now);
        self.commit();

        debug!("event=task_update module=task_store status=ok task_id={task_id}");
        Ok(())
    }

    /// Removes one task, keeping the order of the others.
    pub fn delete_task(&mut self, task_id: TaskId) -> StoreResult<Task> {
        let index = self
            .state
            .tasks
            .iter()
            .position(|task| task.id == task_id)
            .ok_or(StoreError::TaskNotFound(task_id))?;
        let removed = self.state.tasks.remove(index);
        self.commit();

        info!("event=task_delete module=task_store status=ok task_id={task_id}");
        Ok(removed)
    }

    /// Flips completion and returns the new value.
    pub fn toggle_task_completion(&mut self, task_id: TaskId) -> StoreResult<bool> {
        let now = self.clock.now();
        let task = self.task_mut(task_id)?;
        task.completed = !task.completed;
        task.touch(now);
        let completed = task.completed;
        self.commit();

        debug!(
            "event=task_toggle module=task_store status=ok task_id={task_id} completed={completed}"
        );
        Ok(completed)
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.state.tasks.iter().find(|task| task.id == task_id)
    }

    /// All tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn tasks_by_category(&self, category_id: &str) -> Vec<&Task> {
        self.filter(|task| task.category_id == category_id)
    }

    pub fn tasks_by_project(&self, project_id: ProjectId) -> Vec<&Task> {
        self.filter(|task| task.project_id == Some(project_id))
    }

    /// Tasks whose due date falls on `day` (UTC calendar day).
    pub fn tasks_by_date(&self, day: NaiveDate) -> Vec<&Task> {
        self.filter(|task| task.is_due_on(day))
    }

    pub fn tasks_by_tag(&self, tag_id: TagId) -> Vec<&Task> {
        self.filter(|task| task.has_tag(tag_id))
    }

    pub fn completed_tasks(&self) -> Vec<&Task> {
        self.filter(|task| task.completed)
    }

    pub fn incomplete_tasks(&self) -> Vec<&Task> {
        self.filter(|task| !task.completed)
    }

    fn filter(&self, predicate: impl Fn(&Task) -> bool) -> Vec<&Task> {
        self.state
            .tasks
            .iter()
            .filter(|task| predicate(task))
            .collect()
    }

    fn task_mut(&mut self, task_id: TaskId) -> StoreResult<&mut Task> {
        self.state
            .tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .ok_or(StoreError::TaskNotFound(task_id))
    }

    // ---- bulk operations used by the application service --------------------

    /// Deletes every task of `project_id` with a single flush.
    pub fn delete_tasks_by_project(&mut self, project_id: ProjectId) -> Vec<TaskId> {
        let removed = self
            .state
            .tasks
            .iter()
            .filter(|task| task.project_id == Some(project_id))
            .map(|task| task.id)
            .collect::<Vec<_>>();
        if removed.is_empty() {
            return removed;
        }

        self.state
            .tasks
            .retain(|task| task.project_id != Some(project_id));
        self.commit();

        info!(
            "event=task_delete_by_project module=task_store status=ok project_id={project_id} count={}",
            removed.len()
        );
        removed
    }

    /// Moves every task in category `from` to category `to` with a single flush.
    pub fn reassign_category(&mut self, from: &str, to: &CategoryId) -> Vec<TaskId> {
        let now = self.clock.now();
        let mut moved = Vec::new();
        for task in self
            .state
            .tasks
            .iter_mut()
            .filter(|task| task.category_id == from)
        {
            task.category_id = to.clone();
            task.touch(now);
            moved.push(task.id);
        }
        if !moved.is_empty() {
            self.commit();
            info!(
                "event=task_reassign_category module=task_store status=ok count={}",
                moved.len()
            );
        }
        moved
    }

    // ---- subtasks ------------------------------------------------------------

    pub fn add_subtask(
        &mut self,
        task_id: TaskId,
        title: impl Into<String>,
    ) -> StoreResult<SubtaskId> {
        let title = title.into();
        require_title(&title)?;

        let now = self.clock.now();
        let task = self.task_mut(task_id)?;
        let subtask = SubTask {
            id: Uuid::new_v4(),
            title,
            completed: false,
            created_at: now,
        };
        let subtask_id = subtask.id;
        task.subtasks.push(subtask);
        task.touch(now);
        self.commit();

        debug!(
            "event=subtask_create module=task_store status=ok task_id={task_id} subtask_id={subtask_id}"
        );
        Ok(subtask_id)
    }

    pub fn update_subtask(
        &mut self,
        task_id: TaskId,
        subtask_id: SubtaskId,
        patch: SubtaskPatch,
    ) -> StoreResult<()> {
        patch.validate()?;
        self.with_subtask(task_id, subtask_id, |subtask| patch.apply_to(subtask))
    }

    pub fn delete_subtask(&mut self, task_id: TaskId, subtask_id: SubtaskId) -> StoreResult<SubTask> {
        let now = self.clock.now();
        let task = self.task_mut(task_id)?;
        let index = task
            .subtasks
            .iter()
            .position(|subtask| subtask.id == subtask_id)
            .ok_or(StoreError::SubtaskNotFound {
                task_id,
                subtask_id,
            })?;
        let removed = task.subtasks.remove(index);
        task.touch(now);
        self.commit();
        Ok(removed)
    }

    /// Flips one subtask and returns its new completion value.
    pub fn toggle_subtask_completion(
        &mut self,
        task_id: TaskId,
        subtask_id: SubtaskId,
    ) -> StoreResult<bool> {
        let mut completed = false;
        self.with_subtask(task_id, subtask_id, |subtask| {
            subtask.completed = !subtask.completed;
            completed = subtask.completed;
        })?;
        Ok(completed)
    }

    fn with_subtask(
        &mut self,
        task_id: TaskId,
        subtask_id: SubtaskId,
        mutate: impl FnOnce(&mut SubTask),
    ) -> StoreResult<()> {
        let now = self.clock.now();
        let task = self.task_mut(task_id)?;
        let subtask = task
            .subtask_mut(subtask_id)
            .ok_or(StoreError::SubtaskNotFound {
                task_id,
                subtask_id,
            })?;
        mutate(subtask);
        task.touch(now);
        self.commit();
        Ok(())
    }

    // ---- tag registry ------------------------------------------------------

    pub fn add_tag(&mut self, new_tag: NewTag) -> StoreResult<TagId> {
        new_tag.validate()?;
        let tag = Tag {
            id: Uuid::new_v4(),
            name: new_tag.name,
            color: new_tag.color,
        };
        let tag_id = tag.id;
        self.state.tags.push(tag);
        self.commit();

        debug!("event=tag_create module=task_store status=ok tag_id={tag_id}");
        Ok(tag_id)
    }

    /// Updates the registry entry. Tasks resolve tags by id, so every task
    /// carrying this tag observes the change without a rewrite.
    pub fn update_tag(&mut self, tag_id: TagId, patch: TagPatch) -> StoreResult<()> {
        patch.validate()?;
        let tag = self
            .state
            .tags
            .iter_mut()
            .find(|tag| tag.id == tag_id)
            .ok_or(StoreError::TagNotFound(tag_id))?;
        patch.apply_to(tag);
        self.commit();
        Ok(())
    }

    /// Removes the tag from the registry and from every task.
    ///
    /// Tasks losing the id keep their `updated_at`.
    pub fn delete_tag(&mut self, tag_id: TagId) -> StoreResult<Tag> {
        let index = self
            .state
            .tags
            .iter()
            .position(|tag| tag.id == tag_id)
            .ok_or(StoreError::TagNotFound(tag_id))?;
        let removed = self.state.tags.remove(index);
        for task in &mut self.state.tasks {
            task.tag_ids.retain(|id| *id != tag_id);
        }
        self.commit();

        debug!("event=tag_delete module=task_store status=ok tag_id={tag_id}");
        Ok(removed)
    }

    pub fn tag(&self, tag_id: TagId) -> Option<&Tag> {
        self.state.tags.iter().find(|tag| tag.id == tag_id)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.state.tags
    }

    /// Case-insensitive substring match on tag names. Blank query matches all.
    pub fn search_tags(&self, query: &str) -> Vec<&Tag> {
        let needle = query.trim().to_lowercase();
        self.state
            .tags
            .iter()
            .filter(|tag| needle.is_empty() || tag.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Attaches a tag to a task. Returns `false` when it was already attached.
    pub fn assign_tag(&mut self, task_id: TaskId, tag_id: TagId) -> StoreResult<bool> {
        self.ensure_tags_exist(&[tag_id])?;
        let now = self.clock.now();
        let task = self.task_mut(task_id)?;
        if task.has_tag(tag_id) {
            return Ok(false);
        }
        task.tag_ids.push(tag_id);
        task.touch(now);
        self.commit();
        Ok(true)
    }

    /// Detaches a tag from a task. Returns `false` when it was not attached.
    pub fn unassign_tag(&mut self, task_id: TaskId, tag_id: TagId) -> StoreResult<bool> {
        let now = self.clock.now();
        let task = self.task_mut(task_id)?;
        let before = task.tag_ids.len();
        task.tag_ids.retain(|id| *id != tag_id);
        if task.tag_ids.len() == before {
            return Ok(false);
        }
        task.touch(now);
        self.commit();
        Ok(true)
    }

    /// Resolves a task's tag ids through the registry, in task order.
    pub fn resolve_tags(&self, task: &Task) -> Vec<&Tag> {
        task.tag_ids
            .iter()
            .filter_map(|tag_id| self.tag(*tag_id))
            .collect()
    }

    fn ensure_tags_exist(&self, tag_ids: &[TagId]) -> StoreResult<()> {
        match tag_ids.iter().find(|tag_id| self.tag(**tag_id).is_none()) {
            Some(missing) => Err(StoreError::TagNotFound(*missing)),
            None => Ok(()),
        }
    }
}

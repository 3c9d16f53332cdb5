//! Project store.
//!
//! Deleting a project does not touch its tasks here; cascading is done by
//! `AppContext::delete_project_cascade`.

use crate::clock::SharedClock;
use crate::model::project::{NewProject, Project, ProjectId, ProjectPatch};
use crate::repo::slot_repo::{RepoResult, SlotRepository, StoreSlot};
use crate::store::{SlotBinding, StoreError, StoreResult};
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted shape of the `project-storage` slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStoreState {
    #[serde(default)]
    pub projects: Vec<Project>,
}

pub struct ProjectStore<R: SlotRepository> {
    state: ProjectStoreState,
    binding: SlotBinding<R>,
    clock: SharedClock,
}

impl<R: SlotRepository> ProjectStore<R> {
    pub fn load(repo: R, clock: SharedClock) -> RepoResult<Self> {
        let binding = SlotBinding::new(repo, StoreSlot::Projects);
        let state = binding.load()?.unwrap_or_default();
        Ok(Self {
            state,
            binding,
            clock,
        })
    }

    pub fn flush(&self) -> RepoResult<()> {
        self.binding.flush(&self.state)
    }

    pub fn add_project(&mut self, new_project: NewProject) -> StoreResult<ProjectId> {
        new_project.validate()?;
        let now = self.clock.now();
        let project = Project {
            id: Uuid::new_v4(),
            name: new_project.name,
            description: new_project.description,
            color: new_project.color,
            created_at: now,
            updated_at: now,
        };
        let project_id = project.id;
        self.state.projects.push(project);
        self.binding.flush_logged(&self.state);

        info!("event=project_create module=project_store status=ok project_id={project_id}");
        Ok(project_id)
    }

    pub fn update_project(&mut self, project_id: ProjectId, patch: ProjectPatch) -> StoreResult<()> {
        patch.validate()?;
        let now = self.clock.now();
        let project = self
            .state
            .projects
            .iter_mut()
            .find(|project| project.id == project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        patch.apply_to(project);
        if now > project.updated_at {
            project.updated_at = now;
        }
        self.binding.flush_logged(&self.state);
        Ok(())
    }

    pub fn delete_project(&mut self, project_id: ProjectId) -> StoreResult<Project> {
        let index = self
            .state
            .projects
            .iter()
            .position(|project| project.id == project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        let removed = self.state.projects.remove(index);
        self.binding.flush_logged(&self.state);

        info!("event=project_delete module=project_store status=ok project_id={project_id}");
        Ok(removed)
    }

    pub fn project(&self, project_id: ProjectId) -> Option<&Project> {
        self.state
            .projects
            .iter()
            .find(|project| project.id == project_id)
    }

    pub fn projects(&self) -> &[Project] {
        &self.state.projects
    }
}

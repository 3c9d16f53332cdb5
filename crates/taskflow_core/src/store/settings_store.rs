//! Settings store: field setters over the singleton preferences record.

use crate::model::category::CategoryId;
use crate::model::settings::{Settings, SortBy, SortDirection};
use crate::model::task::Priority;
use crate::model::validate::ModelValidationError;
use crate::repo::slot_repo::{RepoResult, SlotRepository, StoreSlot};
use crate::store::{SlotBinding, StoreResult};
use log::debug;

pub struct SettingsStore<R: SlotRepository> {
    settings: Settings,
    binding: SlotBinding<R>,
}

impl<R: SlotRepository> SettingsStore<R> {
    pub fn load(repo: R) -> RepoResult<Self> {
        let binding = SlotBinding::new(repo, StoreSlot::Settings);
        let settings = binding.load()?.unwrap_or_default();
        Ok(Self { settings, binding })
    }

    pub fn flush(&self) -> RepoResult<()> {
        self.binding.flush(&self.settings)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Flips `show_completed_tasks` and returns the new value.
    pub fn toggle_show_completed_tasks(&mut self) -> bool {
        self.settings.show_completed_tasks = !self.settings.show_completed_tasks;
        self.commit("show_completed_tasks");
        self.settings.show_completed_tasks
    }

    pub fn set_default_category(&mut self, category_id: impl Into<CategoryId>) -> StoreResult<()> {
        let category_id = category_id.into();
        if category_id.trim().is_empty() {
            return Err(ModelValidationError::BlankCategoryId.into());
        }
        self.settings.default_category_id = category_id;
        self.commit("default_category_id");
        Ok(())
    }

    pub fn set_default_priority(&mut self, priority: Priority) {
        self.settings.default_priority = priority;
        self.commit("default_priority");
    }

    pub fn set_sort_by(&mut self, sort_by: SortBy) {
        self.settings.sort_by = sort_by;
        self.commit("sort_by");
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        self.settings.sort_direction = direction;
        self.commit("sort_direction");
    }

    /// Restores every preference to its default.
    pub fn reset(&mut self) {
        self.settings = Settings::default();
        self.commit("all");
    }

    fn commit(&self, field: &str) {
        self.binding.flush_logged(&self.settings);
        debug!("event=settings_update module=settings_store status=ok field={field}");
    }
}

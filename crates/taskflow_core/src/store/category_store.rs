//! Category store with protected defaults.
//!
//! # Invariants
//! - Default category ids can never be removed through `delete_category`.
//! - `reset_to_defaults` yields exactly the default seed.

use crate::model::category::{
    default_categories, is_default_category_id, Category, CategoryId, CategoryPatch, NewCategory,
};
use crate::repo::slot_repo::{RepoResult, SlotRepository, StoreSlot};
use crate::store::{SlotBinding, StoreError, StoreResult};
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted shape of the `category-storage` slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStoreState {
    pub categories: Vec<Category>,
}

impl Default for CategoryStoreState {
    fn default() -> Self {
        Self {
            categories: default_categories(),
        }
    }
}

pub struct CategoryStore<R: SlotRepository> {
    state: CategoryStoreState,
    binding: SlotBinding<R>,
}

impl<R: SlotRepository> CategoryStore<R> {
    /// Loads the store; an absent slot starts from the default seed.
    pub fn load(repo: R) -> RepoResult<Self> {
        let binding = SlotBinding::new(repo, StoreSlot::Categories);
        let state = binding.load()?.unwrap_or_default();
        Ok(Self { state, binding })
    }

    pub fn flush(&self) -> RepoResult<()> {
        self.binding.flush(&self.state)
    }

    pub fn add_category(&mut self, new_category: NewCategory) -> StoreResult<CategoryId> {
        new_category.validate()?;
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: new_category.name,
            color: new_category.color,
            icon: new_category.icon,
        };
        let category_id = category.id.clone();
        self.state.categories.push(category);
        self.binding.flush_logged(&self.state);

        info!("event=category_create module=category_store status=ok category_id={category_id}");
        Ok(category_id)
    }

    pub fn update_category(&mut self, category_id: &str, patch: CategoryPatch) -> StoreResult<()> {
        patch.validate()?;
        let category = self
            .state
            .categories
            .iter_mut()
            .find(|category| category.id == category_id)
            .ok_or_else(|| StoreError::CategoryNotFound(category_id.to_string()))?;
        patch.apply_to(category);
        self.binding.flush_logged(&self.state);
        Ok(())
    }

    /// Deletes a custom category.
    ///
    /// # Errors
    /// - `ProtectedCategory` for default ids, whatever the current state.
    /// - `CategoryNotFound` for unknown ids.
    pub fn delete_category(&mut self, category_id: &str) -> StoreResult<Category> {
        if is_default_category_id(category_id) {
            return Err(StoreError::ProtectedCategory(category_id.to_string()));
        }
        let index = self
            .state
            .categories
            .iter()
            .position(|category| category.id == category_id)
            .ok_or_else(|| StoreError::CategoryNotFound(category_id.to_string()))?;
        let removed = self.state.categories.remove(index);
        self.binding.flush_logged(&self.state);

        info!("event=category_delete module=category_store status=ok category_id={category_id}");
        Ok(removed)
    }

    pub fn category(&self, category_id: &str) -> Option<&Category> {
        self.state
            .categories
            .iter()
            .find(|category| category.id == category_id)
    }

    pub fn categories(&self) -> &[Category] {
        &self.state.categories
    }

    pub fn is_default(&self, category_id: &str) -> bool {
        is_default_category_id(category_id)
    }

    /// Replaces every category, custom ones included, with the default seed.
    pub fn reset_to_defaults(&mut self) {
        let discarded = self
            .state
            .categories
            .iter()
            .filter(|category| !is_default_category_id(&category.id))
            .count();
        self.state = CategoryStoreState::default();
        self.binding.flush_logged(&self.state);

        info!("event=category_reset module=category_store status=ok discarded={discarded}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::DEFAULT_CATEGORY_IDS;
    use crate::repo::slot_repo::MemorySlotRepository;

    #[test]
    fn fresh_store_is_seeded_with_defaults() {
        let store = CategoryStore::load(MemorySlotRepository::new()).unwrap();
        let ids = store
            .categories()
            .iter()
            .map(|category| category.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, DEFAULT_CATEGORY_IDS);
    }

    #[test]
    fn update_keeps_id_and_rejects_unknown() {
        let mut store = CategoryStore::load(MemorySlotRepository::new()).unwrap();
        store
            .update_category(
                "work",
                CategoryPatch {
                    name: Some("Office".to_string()),
                    ..CategoryPatch::default()
                },
            )
            .unwrap();
        assert_eq!(store.category("work").unwrap().name, "Office");

        assert_eq!(
            store.update_category("nope", CategoryPatch::default()),
            Err(StoreError::CategoryNotFound("nope".to_string()))
        );
    }
}

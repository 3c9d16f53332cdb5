use taskflow_core::model::category::{default_categories, DEFAULT_CATEGORY_IDS};
use taskflow_core::store::category_store::CategoryStore;
use taskflow_core::store::settings_store::SettingsStore;
use taskflow_core::{
    CategoryPatch, MemorySlotRepository, NewCategory, Priority, SortBy, SortDirection, StoreError,
    StoreErrorKind,
};

#[test]
fn fresh_store_is_seeded_with_defaults() {
    let store = CategoryStore::load(MemorySlotRepository::new()).unwrap();
    assert_eq!(store.categories(), default_categories().as_slice());
    assert!(store.category("personal").is_some());
}

#[test]
fn default_categories_can_never_be_deleted() {
    let mut store = CategoryStore::load(MemorySlotRepository::new()).unwrap();
    for id in DEFAULT_CATEGORY_IDS {
        let err = store.delete_category(id).unwrap_err();
        assert_eq!(err, StoreError::ProtectedCategory(id.to_string()));
        assert_eq!(err.kind(), StoreErrorKind::Conflict);
    }
    assert_eq!(store.categories().len(), DEFAULT_CATEGORY_IDS.len());
}

#[test]
fn scenario_gym_category_is_custom_and_deletable() {
    let mut store = CategoryStore::load(MemorySlotRepository::new()).unwrap();
    let gym = store
        .add_category(NewCategory::new("Gym", "#000", "heart"))
        .unwrap();

    assert!(!DEFAULT_CATEGORY_IDS.contains(&gym.as_str()));
    assert!(!store.is_default(&gym));

    let removed = store.delete_category(&gym).unwrap();
    assert_eq!(removed.name, "Gym");
    assert!(store.category(&gym).is_none());
    assert_eq!(
        store.delete_category(&gym).unwrap_err(),
        StoreError::CategoryNotFound(gym)
    );
}

#[test]
fn reset_to_defaults_discards_custom_and_edited_categories() {
    let mut store = CategoryStore::load(MemorySlotRepository::new()).unwrap();
    store
        .add_category(NewCategory::new("Garden", "#8BC34A", "leaf"))
        .unwrap();
    store
        .update_category(
            "work",
            CategoryPatch {
                name: Some("Office".to_string()),
                ..CategoryPatch::default()
            },
        )
        .unwrap();

    store.reset_to_defaults();
    assert_eq!(store.categories(), default_categories().as_slice());

    store.reset_to_defaults();
    assert_eq!(store.categories(), default_categories().as_slice());
}

#[test]
fn invalid_color_is_rejected() {
    let mut store = CategoryStore::load(MemorySlotRepository::new()).unwrap();
    let err = store
        .add_category(NewCategory::new("Bad", "red", "x"))
        .unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::Invalid);
}

#[test]
fn categories_and_settings_survive_reload() {
    let repo = MemorySlotRepository::new();
    let gym = {
        let mut categories = CategoryStore::load(repo.clone()).unwrap();
        let mut settings = SettingsStore::load(repo.clone()).unwrap();
        let gym = categories
            .add_category(NewCategory::new("Gym", "#FF5722", "dumbbell"))
            .unwrap();
        settings.set_default_category(gym.clone()).unwrap();
        settings.set_default_priority(Priority::High);
        settings.set_sort_by(SortBy::Priority);
        settings.set_sort_direction(SortDirection::Desc);
        assert!(!settings.toggle_show_completed_tasks());
        gym
    };

    let categories = CategoryStore::load(repo.clone()).unwrap();
    let settings = SettingsStore::load(repo).unwrap();
    assert!(categories.category(&gym).is_some());

    let prefs = settings.settings();
    assert_eq!(prefs.default_category_id, gym);
    assert_eq!(prefs.default_priority, Priority::High);
    assert_eq!(prefs.sort_by, SortBy::Priority);
    assert_eq!(prefs.sort_direction, SortDirection::Desc);
    assert!(!prefs.show_completed_tasks);
}

use chrono::{NaiveDate, TimeZone, Utc};
use std::rc::Rc;
use taskflow_core::db::{open_db, open_db_in_memory};
use taskflow_core::repo::legacy_id;
use taskflow_core::repo::slot_codec::CURRENT_SLOT_VERSION;
use taskflow_core::{
    AppContext, AppServiceError, MemorySlotRepository, NewCategory, NewProject, NewTag,
    Priority, RepoError, SharedClock, SlotRepository, SortBy, SqliteSlotRepository, StepClock,
    StoreError, StoreSlot, TaskPatch, TaskTab,
};

fn clock() -> SharedClock {
    Rc::new(StepClock::starting_at(
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
    ))
}

fn memory_app() -> (MemorySlotRepository, AppContext<MemorySlotRepository>) {
    let repo = MemorySlotRepository::new();
    let app = AppContext::load(repo.clone(), clock()).unwrap();
    (repo, app)
}

#[test]
fn project_cascade_removes_only_that_projects_tasks() {
    let (_repo, mut app) = memory_app();
    let home = app
        .projects
        .add_project(NewProject::new("Home", "#4CAF50"))
        .unwrap();
    let office = app
        .projects
        .add_project(NewProject::new("Office", "#2196F3"))
        .unwrap();

    let mut paint = app.new_task_draft("Paint fence");
    paint.project_id = Some(home);
    let paint = app.create_task(paint).unwrap();
    let mut report = app.new_task_draft("Report");
    report.project_id = Some(office);
    let report = app.create_task(report).unwrap();
    let loose = app.create_task(app.new_task_draft("Call mom")).unwrap();

    let deletion = app.delete_project_cascade(home).unwrap();
    assert_eq!(deletion.project.id, home);
    assert_eq!(deletion.removed_task_ids, vec![paint]);

    let remaining = app.tasks.tasks().iter().map(|task| task.id).collect::<Vec<_>>();
    assert_eq!(remaining, vec![report, loose]);
    assert!(app.projects.project(home).is_none());

    assert_eq!(
        app.delete_project_cascade(home).unwrap_err(),
        AppServiceError::Store(StoreError::ProjectNotFound(home))
    );
}

#[test]
fn deleting_custom_category_reassigns_tasks_and_default_setting() {
    let (_repo, mut app) = memory_app();
    let gym = app
        .categories
        .add_category(NewCategory::new("Gym", "#FF5722", "dumbbell"))
        .unwrap();
    app.settings.set_default_category(gym.clone()).unwrap();

    let leg_day = app.create_task(app.new_task_draft("Leg day")).unwrap();
    assert_eq!(app.tasks.task(leg_day).unwrap().category_id, gym);

    let deletion = app.delete_category_reassign(&gym).unwrap();
    assert_eq!(deletion.reassigned_task_ids, vec![leg_day]);
    assert!(deletion.default_setting_reset);

    assert_eq!(app.tasks.task(leg_day).unwrap().category_id, "personal");
    assert_eq!(app.settings.settings().default_category_id, "personal");
    assert!(app.categories.category(&gym).is_none());
}

#[test]
fn default_category_delete_is_rejected_and_tasks_untouched() {
    let (_repo, mut app) = memory_app();
    let mut draft = app.new_task_draft("Budget");
    draft.category_id = "finance".to_string();
    let budget = app.create_task(draft).unwrap();

    let err = app.delete_category_reassign("finance").unwrap_err();
    assert_eq!(
        err,
        AppServiceError::Store(StoreError::ProtectedCategory("finance".to_string()))
    );
    assert_eq!(app.tasks.task(budget).unwrap().category_id, "finance");
}

#[test]
fn task_references_are_checked() {
    let (_repo, mut app) = memory_app();

    let mut draft = app.new_task_draft("Orphan");
    draft.category_id = "nowhere".to_string();
    assert_eq!(
        app.create_task(draft).unwrap_err(),
        AppServiceError::UnknownCategory("nowhere".to_string())
    );

    let task_id = app.create_task(app.new_task_draft("Real")).unwrap();
    let ghost = uuid::Uuid::new_v4();
    let err = app
        .update_task(
            task_id,
            TaskPatch {
                project_id: Some(Some(ghost)),
                ..TaskPatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err, AppServiceError::UnknownProject(ghost));
    assert!(app.tasks.task(task_id).unwrap().project_id.is_none());
}

#[test]
fn draft_uses_default_priority_and_list_follows_sort_setting() {
    let (_repo, mut app) = memory_app();
    app.settings.set_default_priority(Priority::Low);
    app.settings.set_sort_by(SortBy::Priority);

    let low = app.create_task(app.new_task_draft("low")).unwrap();
    let mut urgent = app.new_task_draft("urgent");
    urgent.priority = Priority::High;
    let urgent = app.create_task(urgent).unwrap();
    let done = app.create_task(app.new_task_draft("done")).unwrap();
    app.tasks.toggle_task_completion(done).unwrap();

    let open = app
        .list_tasks(TaskTab::All, None, None)
        .into_iter()
        .map(|task| task.id)
        .collect::<Vec<_>>();
    assert_eq!(open, vec![urgent, low]);

    let completed = app.list_tasks(TaskTab::Completed, None, None);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, done);
}

#[test]
fn tasks_for_day_returns_tasks_due_that_day() {
    let (_repo, mut app) = memory_app();
    let mut draft = app.new_task_draft("Dentist");
    draft.due_date = Some(Utc.with_ymd_and_hms(2024, 5, 7, 15, 30, 0).unwrap());
    let dentist = app.create_task(draft).unwrap();
    app.create_task(app.new_task_draft("Undated")).unwrap();

    let day = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
    let ids = app
        .tasks_for_day(day)
        .into_iter()
        .map(|task| task.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![dentist]);
}

#[test]
fn state_round_trips_through_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskflow.db");

    let (snapshot_tasks, snapshot_projects, snapshot_categories, snapshot_settings) = {
        let conn = open_db(&path).unwrap();
        let repo = SqliteSlotRepository::try_new(&conn).unwrap();
        let mut app = AppContext::load(repo, clock()).unwrap();

        let project = app
            .projects
            .add_project(NewProject::new("Renovation", "#795548"))
            .unwrap();
        let tag = app.tasks.add_tag(NewTag::new("diy", "#FF9800")).unwrap();
        let mut draft = app.new_task_draft("Tile bathroom");
        draft.project_id = Some(project);
        draft.tag_ids = vec![tag];
        draft.subtask_titles = vec!["Buy tiles".to_string()];
        draft.due_date = Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let task_id = app.create_task(draft).unwrap();
        let subtask_id = app.tasks.task(task_id).unwrap().subtasks[0].id;
        app.tasks
            .toggle_subtask_completion(task_id, subtask_id)
            .unwrap();
        app.categories
            .add_category(NewCategory::new("Garden", "#8BC34A", "leaf"))
            .unwrap();
        app.settings.toggle_show_completed_tasks();
        app.flush_all().unwrap();

        (
            app.tasks.state().clone(),
            app.projects.projects().to_vec(),
            app.categories.categories().to_vec(),
            app.settings.settings().clone(),
        )
    };

    let conn = open_db(&path).unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    let reloaded = AppContext::load(repo, clock()).unwrap();

    assert_eq!(reloaded.tasks.state(), &snapshot_tasks);
    assert_eq!(reloaded.projects.projects(), snapshot_projects.as_slice());
    assert_eq!(
        reloaded.categories.categories(),
        snapshot_categories.as_slice()
    );
    assert_eq!(reloaded.settings.settings(), &snapshot_settings);
}

#[test]
fn slot_written_by_newer_version_is_rejected_on_load() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::try_new(&conn).unwrap();
    repo.write_slot(StoreSlot::Projects, CURRENT_SLOT_VERSION + 1, r#"{"projects":[]}"#)
        .unwrap();

    let err = AppContext::load(repo, clock()).err().expect("load should fail");
    assert!(matches!(
        err,
        RepoError::UnsupportedSlotVersion {
            slot: StoreSlot::Projects,
            ..
        }
    ));
}

#[test]
fn legacy_envelope_slot_loads() {
    let repo = MemorySlotRepository::new();
    repo.write_slot(
        StoreSlot::Settings,
        0,
        r#"{"state":{"sortBy":"createdAt","showCompletedTasks":false},"version":0}"#,
    )
    .unwrap();

    let app = AppContext::load(repo, clock()).unwrap();
    assert_eq!(app.settings.settings().sort_by, SortBy::CreatedAt);
    assert!(!app.settings.settings().show_completed_tasks);
}

const LEGACY_TASK_SLOT: &str = r##"{"state":{"tasks":[{"id":"1700000000000","title":"Renew passport","description":"","completed":false,"dueDate":"2023-11-20T00:00:00.000Z","categoryId":"personal","priorityId":"high","projectId":"1699999999999","tags":[{"id":"1700000000001","name":"errands","color":"#FF9800"}],"reminder":{"date":"2023-11-19T00:00:00.000Z","time":"09:30","enabled":true},"recurrence":{"type":"none","enabled":false},"subtasks":[{"id":"1700000000002","title":"Take photo","completed":true,"createdAt":"2023-11-14T22:13:20.000Z"}],"createdAt":"2023-11-14T22:13:20.000Z","updatedAt":"2023-11-14T22:13:20.000Z"},{"id":"1700000000100","title":"Loose end","completed":true,"categoryId":"work","priorityId":"low","tags":[],"recurrence":{"type":"none","enabled":false},"subtasks":[],"createdAt":"2023-11-14T22:15:00.000Z","updatedAt":"2023-11-14T22:16:00.000Z"}],"tags":[{"id":"1700000000001","name":"errands","color":"#FF9800"}]},"version":0}"##;

const LEGACY_PROJECT_SLOT: &str = r##"{"state":{"projects":[{"id":"1699999999999","name":"Travel","description":"Trip prep","color":"#2196F3","createdAt":"2023-11-14T22:13:19.000Z","updatedAt":"2023-11-14T22:13:19.000Z"}]},"version":0}"##;

#[test]
fn legacy_task_and_project_slots_load_with_stable_ids() {
    let repo = MemorySlotRepository::new();
    repo.write_slot(StoreSlot::Tasks, 0, LEGACY_TASK_SLOT).unwrap();
    repo.write_slot(StoreSlot::Projects, 0, LEGACY_PROJECT_SLOT)
        .unwrap();

    let mut app = AppContext::load(repo.clone(), clock()).unwrap();

    let project_id = legacy_id("1699999999999");
    let task_id = legacy_id("1700000000000");
    let tag_id = legacy_id("1700000000001");
    assert_eq!(app.projects.project(project_id).unwrap().name, "Travel");

    let task = app.tasks.task(task_id).unwrap();
    assert_eq!(task.project_id, Some(project_id));
    assert_eq!(task.tag_ids, vec![tag_id]);
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.subtasks[0].id, legacy_id("1700000000002"));
    let tag_names = app
        .tasks
        .resolve_tags(task)
        .into_iter()
        .map(|tag| tag.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(tag_names, vec!["errands"]);
    assert_eq!(app.tasks.tasks_by_tag(tag_id).len(), 1);

    // Rewriting the slots stores v1 payloads with the same ids.
    app.tasks.toggle_task_completion(task_id).unwrap();
    app.flush_all().unwrap();
    assert_eq!(
        repo.read_slot(StoreSlot::Tasks).unwrap().unwrap().schema_version,
        CURRENT_SLOT_VERSION
    );
    let mut reloaded = AppContext::load(repo, clock()).unwrap();
    assert!(reloaded.tasks.task(task_id).unwrap().completed);

    let deletion = reloaded.delete_project_cascade(project_id).unwrap();
    assert_eq!(deletion.removed_task_ids, vec![task_id]);
    assert_eq!(reloaded.tasks.tasks().len(), 1);
}

#[test]
fn every_mutation_writes_through_to_its_slot() {
    let (repo, mut app) = memory_app();
    assert_eq!(repo.slot_count(), 0);

    app.create_task(app.new_task_draft("write-through")).unwrap();
    let record = repo.read_slot(StoreSlot::Tasks).unwrap().unwrap();
    assert_eq!(record.write_count, 1);
    assert_eq!(record.schema_version, CURRENT_SLOT_VERSION);
    assert_eq!(repo.slot_count(), 1);
}

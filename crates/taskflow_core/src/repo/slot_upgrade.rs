//! Version 0 to version 1 rewrite of slot state.
//!
//! Version 0 rows come from the key-value persist envelope
//! `{"state": {...}, "version": 0}`. Inside it, task, subtask, tag and project
//! ids are millisecond-timestamp strings such as `"1700000000000"`, and every
//! task embeds full tag objects under `tags` instead of referencing the
//! registry.
//!
//! # Invariants
//! - One legacy id maps to one UUID, in every slot and on every load, so
//!   `projectId` references keep pointing at the same project.
//! - Ids that already parse as UUIDs are kept as they are.
//! - A tag embedded in a task but missing from the registry is added to it.

use crate::repo::slot_repo::{RepoError, RepoResult, StoreSlot};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Namespace for v5 UUIDs minted from legacy string ids.
pub const LEGACY_ID_NAMESPACE: Uuid =
    Uuid::from_u128(0x3b5d_8a6e_1f4c_4d2a_9b7e_6c0f_2e91_a4d7);

/// UUID a legacy id maps to.
pub fn legacy_id(raw: &str) -> Uuid {
    let raw = raw.trim();
    Uuid::parse_str(raw).unwrap_or_else(|_| Uuid::new_v5(&LEGACY_ID_NAMESPACE, raw.as_bytes()))
}

/// Unwraps the v0 envelope and rewrites its state into the v1 shape.
pub(crate) fn upgrade_v0(slot: StoreSlot, payload: Value) -> RepoResult<Value> {
    let Value::Object(mut envelope) = payload else {
        return Err(invalid(slot, "version 0 payload is not an object"));
    };
    let state = envelope
        .remove("state")
        .ok_or_else(|| invalid(slot, "version 0 payload has no `state` field"))?;

    match slot {
        StoreSlot::Tasks => upgrade_tasks(slot, state),
        StoreSlot::Projects => upgrade_projects(slot, state),
        StoreSlot::Categories | StoreSlot::Settings => Ok(state),
    }
}

fn upgrade_tasks(slot: StoreSlot, state: Value) -> RepoResult<Value> {
    let mut state = into_object(slot, state, "state")?;

    let mut registry = take_array(slot, &mut state, "tags")?;
    let mut known = Vec::with_capacity(registry.len());
    for tag in &mut registry {
        known.push(rewrite_id(slot, tag, "tag")?);
    }

    let mut tasks = take_array(slot, &mut state, "tasks")?;
    for task in &mut tasks {
        let task = as_object_mut(slot, task, "task")?;
        rewrite_object_id(slot, task, "task")?;
        rewrite_reference(slot, task, "projectId")?;

        if let Some(Value::Array(subtasks)) = task.get_mut("subtasks") {
            for subtask in subtasks {
                rewrite_id(slot, subtask, "subtask")?;
            }
        }

        let embedded = match task.remove("tags") {
            Some(Value::Array(tags)) => tags,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(invalid(slot, "task `tags` is not an array")),
        };
        let mut tag_ids: Vec<Uuid> = Vec::with_capacity(embedded.len());
        for mut tag in embedded {
            let tag_id = rewrite_id(slot, &mut tag, "tag")?;
            if !known.contains(&tag_id) {
                known.push(tag_id);
                registry.push(tag);
            }
            if !tag_ids.contains(&tag_id) {
                tag_ids.push(tag_id);
            }
        }
        if !task.contains_key("tagIds") {
            task.insert(
                "tagIds".to_string(),
                Value::Array(
                    tag_ids
                        .into_iter()
                        .map(|id| Value::String(id.to_string()))
                        .collect(),
                ),
            );
        }
    }

    state.insert("tasks".to_string(), Value::Array(tasks));
    state.insert("tags".to_string(), Value::Array(registry));
    Ok(Value::Object(state))
}

fn upgrade_projects(slot: StoreSlot, state: Value) -> RepoResult<Value> {
    let mut state = into_object(slot, state, "state")?;
    let mut projects = take_array(slot, &mut state, "projects")?;
    for project in &mut projects {
        rewrite_id(slot, project, "project")?;
    }
    state.insert("projects".to_string(), Value::Array(projects));
    Ok(Value::Object(state))
}

fn rewrite_id(slot: StoreSlot, entity: &mut Value, what: &str) -> RepoResult<Uuid> {
    rewrite_object_id(slot, as_object_mut(slot, entity, what)?, what)
}

fn rewrite_object_id(
    slot: StoreSlot,
    entity: &mut Map<String, Value>,
    what: &str,
) -> RepoResult<Uuid> {
    let id = entity
        .get("id")
        .and_then(legacy_value_id)
        .ok_or_else(|| invalid(slot, &format!("{what} has no usable `id`")))?;
    entity.insert("id".to_string(), Value::String(id.to_string()));
    Ok(id)
}

/// Optional reference: blank or null values are dropped, others mapped.
fn rewrite_reference(
    slot: StoreSlot,
    entity: &mut Map<String, Value>,
    key: &str,
) -> RepoResult<()> {
    let Some(raw) = entity.remove(key) else {
        return Ok(());
    };
    match raw {
        Value::Null => Ok(()),
        Value::String(ref text) if text.trim().is_empty() => Ok(()),
        other => {
            let id = legacy_value_id(&other)
                .ok_or_else(|| invalid(slot, &format!("`{key}` is not an id")))?;
            entity.insert(key.to_string(), Value::String(id.to_string()));
            Ok(())
        }
    }
}

fn legacy_value_id(value: &Value) -> Option<Uuid> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(legacy_id(text)),
        Value::Number(number) => Some(legacy_id(&number.to_string())),
        _ => None,
    }
}

fn take_array(
    slot: StoreSlot,
    object: &mut Map<String, Value>,
    key: &str,
) -> RepoResult<Vec<Value>> {
    match object.remove(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(_) => Err(invalid(slot, &format!("`{key}` is not an array"))),
    }
}

fn into_object(slot: StoreSlot, value: Value, what: &str) -> RepoResult<Map<String, Value>> {
    match value {
        Value::Object(object) => Ok(object),
        _ => Err(invalid(slot, &format!("{what} is not an object"))),
    }
}

fn as_object_mut<'v>(
    slot: StoreSlot,
    value: &'v mut Value,
    what: &str,
) -> RepoResult<&'v mut Map<String, Value>> {
    value
        .as_object_mut()
        .ok_or_else(|| invalid(slot, &format!("{what} is not an object")))
}

fn invalid(slot: StoreSlot, detail: &str) -> RepoError {
    RepoError::InvalidData(format!("slot `{}` {detail}", slot.key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_ids_map_deterministically_and_uuids_pass_through() {
        let first = legacy_id("1700000000000");
        assert_eq!(first, legacy_id("1700000000000"));
        assert_ne!(first, legacy_id("1700000000001"));
        assert_eq!(first.get_version_num(), 5);

        let existing = Uuid::new_v4();
        assert_eq!(legacy_id(&existing.to_string()), existing);
    }

    #[test]
    fn numeric_and_string_ids_agree() {
        let payload = json!({
            "state": { "projects": [{ "id": 1700000000000u64, "name": "Home" }] },
            "version": 0
        });
        let upgraded = upgrade_v0(StoreSlot::Projects, payload).unwrap();
        assert_eq!(
            upgraded["projects"][0]["id"],
            json!(legacy_id("1700000000000").to_string())
        );
    }

    #[test]
    fn embedded_task_tags_become_registry_references() {
        let payload = json!({
            "state": {
                "tasks": [{
                    "id": "1700000000010",
                    "projectId": "",
                    "tags": [
                        { "id": "1700000000001", "name": "home", "color": "#123" },
                        { "id": "1700000000002", "name": "lost", "color": "#456" },
                        { "id": "1700000000001", "name": "home", "color": "#123" }
                    ],
                    "subtasks": [{ "id": "1700000000011", "title": "a" }]
                }],
                "tags": [{ "id": "1700000000001", "name": "home", "color": "#123" }]
            },
            "version": 0
        });

        let upgraded = upgrade_v0(StoreSlot::Tasks, payload).unwrap();
        let task = &upgraded["tasks"][0];
        let home = legacy_id("1700000000001").to_string();
        let lost = legacy_id("1700000000002").to_string();

        assert_eq!(task["id"], json!(legacy_id("1700000000010").to_string()));
        assert_eq!(task["tagIds"], json!([home, lost]));
        assert!(task.get("tags").is_none());
        assert!(task.get("projectId").is_none());
        assert_eq!(
            task["subtasks"][0]["id"],
            json!(legacy_id("1700000000011").to_string())
        );

        let registry = upgraded["tags"].as_array().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry[1]["name"], "lost");
    }

    #[test]
    fn task_without_id_is_invalid() {
        let payload = json!({ "state": { "tasks": [{ "title": "x" }] }, "version": 0 });
        let err = upgrade_v0(StoreSlot::Tasks, payload).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("task-storage")));
    }
}

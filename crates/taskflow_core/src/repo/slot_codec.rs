//! JSON encoding and version gate for slot payloads.
//!
//! # Invariants
//! - Every payload is written with `CURRENT_SLOT_VERSION`.
//! - A payload with a newer version is rejected.
//! - Older payloads pass through `upgrade_payload` before decoding; version 0
//!   ids are remapped to UUIDs there (see `slot_upgrade`).

use crate::repo::slot_repo::{RepoError, RepoResult, SlotRecord, StoreSlot};
use crate::repo::slot_upgrade;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Payload schema version written by this build.
pub const CURRENT_SLOT_VERSION: u32 = 1;

pub fn encode_state<T: Serialize>(state: &T) -> RepoResult<String> {
    Ok(serde_json::to_string(state)?)
}

/// Decodes a slot row into store state, upgrading older payloads first.
pub fn decode_state<T: DeserializeOwned>(record: &SlotRecord) -> RepoResult<T> {
    if record.schema_version > CURRENT_SLOT_VERSION {
        return Err(RepoError::UnsupportedSlotVersion {
            slot: record.slot,
            stored: record.schema_version,
            supported: CURRENT_SLOT_VERSION,
        });
    }

    let raw: Value = serde_json::from_str(&record.payload)?;
    let upgraded = upgrade_payload(record.slot, record.schema_version, raw)?;
    Ok(serde_json::from_value(upgraded)?)
}

fn upgrade_payload(slot: StoreSlot, from_version: u32, payload: Value) -> RepoResult<Value> {
    match from_version {
        CURRENT_SLOT_VERSION => Ok(payload),
        0 => slot_upgrade::upgrade_v0(slot, payload),
        other => Err(RepoError::InvalidData(format!(
            "slot `{}` has unknown schema version {other}",
            slot.key()
        ))),
    }
}

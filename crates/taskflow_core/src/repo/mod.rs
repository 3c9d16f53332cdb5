//! Persistence adapter: named slots holding each store's serialized state.
//!
//! # Responsibility
//! - Define the slot storage contract stores flush into.
//! - Provide SQLite-backed and in-memory implementations.
//! - Own payload versioning (`schema_version` per slot).
//!
//! # Invariants
//! - One slot per store; a write replaces the whole slot payload.
//! - Payloads written by a newer slot schema are rejected, never coerced.

pub mod slot_codec;
pub mod slot_repo;
mod slot_upgrade;

pub use slot_upgrade::{legacy_id, LEGACY_ID_NAMESPACE};

//! Domain model for tasks, projects, categories and settings.
//!
//! # Responsibility
//! - Define the records owned by the four stores.
//! - Define creation payloads (`New*`) and partial updates (`*Patch`) that
//!   callers hand to store operations.
//!
//! # Invariants
//! - Every entity except categories is identified by a UUID v4 that never
//!   changes after creation. Category ids are strings so defaults can use
//!   stable well-known ids.
//! - Persisted field names are camelCase.
//! - Cross-entity references are ids only; integrity is enforced by the
//!   application service, not by the model.

pub mod category;
pub mod project;
pub mod settings;
pub mod task;
pub mod validate;

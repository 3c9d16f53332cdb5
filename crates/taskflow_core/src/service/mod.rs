//! Use-case layer above the stores.
//!
//! # Responsibility
//! - Hold every store behind one explicit context handle.
//! - Apply rules that span more than one store.

pub mod app_context;

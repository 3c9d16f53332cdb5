//! FFI crate entry for TaskFlow.

pub mod api;

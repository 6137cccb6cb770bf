//! Core use-case services.
//!
//! # Responsibility
//! - Own the authoritative task collection and its change notifications.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod subscribers;
pub mod task_store;

//! Domain model for the week planner.
//!
//! # Responsibility
//! - Define canonical data structures used by the store and query layer.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Deletion is permanent; there are no tombstones.

pub mod task;

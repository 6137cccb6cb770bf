//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define storage contracts used by the task store.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories store opaque values; encoding belongs to the caller.

pub mod kv_repo;

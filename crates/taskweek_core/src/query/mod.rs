//! Derived task views.
//!
//! # Responsibility
//! - Provide pure, date-based filtering and ordering over task snapshots.
//! - Own calendar arithmetic (day truncation, week intervals).

pub mod calendar;
pub mod task_query;

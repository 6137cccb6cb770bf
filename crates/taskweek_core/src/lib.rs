//! Core task data manager for the week planner.
//! This crate is the single source of truth for task storage and queries.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{ConfigError, PlannerConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{
    parse_color_hex, InvalidPriority, Priority, Rgb, Task, TaskId, DEFAULT_COLOR_HEX,
    DEFAULT_TASK_TITLE,
};
pub use query::calendar::{
    is_same_day, local_day, start_of_day, today, week_days, ParseWeekStartError, WeekInterval,
    WeekStart,
};
pub use query::task_query::{tasks_for_day, tasks_for_week, tasks_in_week, week_agenda, DayAgenda};
pub use repo::kv_repo::{KeyValueRepository, RepoError, RepoResult, SqliteKvRepository};
pub use service::subscribers::{SubscriberRegistry, SubscriptionId, TaskListener};
pub use service::task_store::{
    sample_tasks, LoadOutcome, StoreError, StoreResult, TaskStore, TASKS_SNAPSHOT_KEY,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

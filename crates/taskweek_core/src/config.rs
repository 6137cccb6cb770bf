//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve the database path, week-start rule and logging settings.
//!
//! # Invariants
//! - `from_env` never fails; invalid values fall back to defaults with a
//!   warning.

use crate::logging::{default_log_level, normalize_level};
use crate::query::calendar::{ParseWeekStartError, WeekStart};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "TASKWEEK_DB_PATH";
pub const WEEK_START_ENV: &str = "TASKWEEK_WEEK_START";
pub const LOG_LEVEL_ENV: &str = "TASKWEEK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "TASKWEEK_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "taskweek.sqlite3";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    WeekStart(ParseWeekStartError),
    LogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WeekStart(err) => write!(f, "{err}"),
            Self::LogLevel(value) => write!(f, "unsupported log level `{value}`"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::WeekStart(err) => Some(err),
            Self::LogLevel(_) => None,
        }
    }
}

impl From<ParseWeekStartError> for ConfigError {
    fn from(value: ParseWeekStartError) -> Self {
        Self::WeekStart(value)
    }
}

/// Planner settings shared by the FFI layer and the CLI probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    pub db_path: PathBuf,
    pub week_start: WeekStart,
    pub log_level: &'static str,
    /// File logging is enabled only when set.
    pub log_dir: Option<PathBuf>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            week_start: WeekStart::default(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl PlannerConfig {
    /// Reads `TASKWEEK_*` variables over the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env` with a caller-provided variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(DB_PATH_ENV) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                config.db_path = PathBuf::from(trimmed);
            }
        }

        config.log_dir = lookup(LOG_DIR_ENV)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        if let Some(raw) = lookup(WEEK_START_ENV) {
            match Self::parse_week_start(&raw) {
                Ok(week_start) => config.week_start = week_start,
                Err(err) => warn!(
                    "event=config_load module=config status=fallback key={} error={}",
                    WEEK_START_ENV, err
                ),
            }
        }

        if let Some(raw) = lookup(LOG_LEVEL_ENV) {
            match Self::parse_log_level(&raw) {
                Ok(level) => config.log_level = level,
                Err(err) => warn!(
                    "event=config_load module=config status=fallback key={} error={}",
                    LOG_LEVEL_ENV, err
                ),
            }
        }

        config
    }

    pub fn parse_week_start(raw: &str) -> Result<WeekStart, ConfigError> {
        Ok(raw.parse::<WeekStart>()?)
    }

    pub fn parse_log_level(raw: &str) -> Result<&'static str, ConfigError> {
        normalize_level(raw).map_err(|_| ConfigError::LogLevel(raw.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, PlannerConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV, WEEK_START_ENV,
    };
    use crate::query::calendar::WeekStart;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn from_lookup_applies_valid_overrides() {
        let config = PlannerConfig::from_lookup(lookup_from(&[
            (DB_PATH_ENV, " /data/planner.sqlite3 "),
            (WEEK_START_ENV, "Sunday"),
            (LOG_LEVEL_ENV, "WARN"),
            (LOG_DIR_ENV, "/var/log/taskweek"),
        ]));

        assert_eq!(config.db_path, PathBuf::from("/data/planner.sqlite3"));
        assert_eq!(config.week_start, WeekStart::Sunday);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/taskweek")));
    }

    #[test]
    fn from_lookup_falls_back_on_invalid_or_blank_values() {
        let config = PlannerConfig::from_lookup(lookup_from(&[
            (DB_PATH_ENV, "   "),
            (WEEK_START_ENV, "friday"),
            (LOG_LEVEL_ENV, "loud"),
            (LOG_DIR_ENV, ""),
        ]));

        assert_eq!(config, PlannerConfig::default());
    }

    #[test]
    fn parse_week_start_reports_config_error() {
        let err = PlannerConfig::parse_week_start("friday").unwrap_err();
        assert!(matches!(err, ConfigError::WeekStart(_)));
        assert!(err.to_string().contains("monday|sunday"));
    }
}

//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose task store operations and queries to Dart via FRB.
//! - Translate between core types and flat string-based DTOs.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Store access is serialized process-wide; each call loads, mutates and
//!   persists before releasing the lock.
//! - Dates cross the boundary as `YYYY-MM-DD`, times as `HH:MM`.

use chrono::{NaiveDate, NaiveTime};
use log::warn;
use std::sync::{Mutex, OnceLock, PoisonError};
use taskweek_core::db::open_db;
use taskweek_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    PlannerConfig, Priority, SqliteKvRepository, Task, TaskStore,
};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

static PLANNER_CONFIG: OnceLock<PlannerConfig> = OnceLock::new();
static STORE_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Flat task shape used by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    /// Stable task ID in string form.
    pub id: String,
    pub title: Option<String>,
    /// `YYYY-MM-DD`.
    pub date: Option<String>,
    /// `HH:MM`.
    pub start_time: Option<String>,
    /// `HH:MM`.
    pub end_time: Option<String>,
    pub is_done: bool,
    pub location: Option<String>,
    pub note: Option<String>,
    /// `0=low|1=medium|2=high`.
    pub priority: u8,
    pub color_hex: String,
}

/// Response envelope for list and query calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    /// Ordered items (insertion order for `tasks_list`, query order otherwise).
    pub items: Vec<TaskItem>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

impl TaskListResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            message: message.into(),
        }
    }
}

/// Response envelope for mutating calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    pub ok: bool,
    /// Whether the stored collection changed. `false` for unknown IDs.
    pub changed: bool,
    /// Created task for `tasks_add`.
    pub task: Option<TaskItem>,
    pub message: String,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, changed: bool, task: Option<TaskItem>) -> Self {
        Self {
            ok: true,
            changed,
            task,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            task: None,
            message: message.into(),
        }
    }
}

/// Returns the full collection in insertion order.
///
/// # FFI contract
/// - Sync call, DB-backed execution. Seeds sample tasks on first use.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_list() -> TaskListResponse {
    list_response("tasks_list", |store| Ok(store.snapshot()))
}

/// Returns tasks of one day ordered by start time.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_for_day(date: String) -> TaskListResponse {
    list_response("tasks_for_day", |store| {
        let day = parse_date(&date)?;
        Ok(store.tasks_for_day(day))
    })
}

/// Returns tasks of the week containing `date` (today when `None`).
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_for_week(date: Option<String>) -> TaskListResponse {
    list_response("tasks_for_week", |store| {
        let reference = date.as_deref().map(parse_date).transpose()?;
        Ok(store.tasks_for_week(reference))
    })
}

/// Creates a default "New Task" on `date`.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_add(date: String) -> TaskActionResponse {
    let result = with_store(|store| {
        let day = parse_date(&date)?;
        store.add_task(day).map_err(|err| err.to_string())
    });
    match result {
        Ok(task) => TaskActionResponse::success("Task created.", true, Some(to_task_item(&task))),
        Err(err) => TaskActionResponse::failure(format!("tasks_add failed: {err}")),
    }
}

/// Replaces a stored task with a fully populated item.
///
/// Unknown IDs succeed with `changed = false`.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_update(item: TaskItem) -> TaskActionResponse {
    let result = with_store(|store| {
        let task = from_task_item(&item)?;
        store.update_task(&task).map_err(|err| err.to_string())
    });
    match result {
        Ok(true) => TaskActionResponse::success("Task updated.", true, None),
        Ok(false) => TaskActionResponse::success("Task not found; nothing changed.", false, None),
        Err(err) => TaskActionResponse::failure(format!("tasks_update failed: {err}")),
    }
}

/// Deletes a task by ID. Unknown IDs succeed with `changed = false`.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_delete(task_id: String) -> TaskActionResponse {
    let result = with_store(|store| {
        let id = parse_task_id(&task_id)?;
        store.delete_task_by_id(id).map_err(|err| err.to_string())
    });
    match result {
        Ok(true) => TaskActionResponse::success("Task deleted.", true, None),
        Ok(false) => TaskActionResponse::success("Task not found; nothing changed.", false, None),
        Err(err) => TaskActionResponse::failure(format!("tasks_delete failed: {err}")),
    }
}

fn list_response(
    operation: &'static str,
    f: impl FnOnce(&mut TaskStore<SqliteKvRepository<'_>>) -> Result<Vec<Task>, String>,
) -> TaskListResponse {
    match with_store(f) {
        Ok(tasks) => TaskListResponse {
            ok: true,
            message: format!("Found {} task(s).", tasks.len()),
            items: tasks.iter().map(to_task_item).collect(),
        },
        Err(err) => TaskListResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn resolve_config() -> &'static PlannerConfig {
    PLANNER_CONFIG.get_or_init(PlannerConfig::from_env)
}

fn with_store<T>(
    f: impl FnOnce(&mut TaskStore<SqliteKvRepository<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    // Poisoning is ignored; state lives in the database.
    let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let config = resolve_config();
    let conn = open_db(&config.db_path).map_err(|err| format!("task DB open failed: {err}"))?;
    let repo = SqliteKvRepository::try_new(&conn)
        .map_err(|err| format!("task repo init failed: {err}"))?;
    let mut store = TaskStore::open(repo).with_week_start(config.week_start);
    f(&mut store)
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|err| format!("invalid date `{}`: {err}", value.trim()))
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|err| format!("invalid time `{trimmed}`: {err}"))
}

fn parse_task_id(value: &str) -> Result<Uuid, String> {
    Uuid::parse_str(value.trim()).map_err(|err| format!("invalid task id `{}`: {err}", value.trim()))
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id.to_string(),
        title: task.title.clone(),
        date: task.date.map(|date| date.format(DATE_FORMAT).to_string()),
        start_time: task.start_time.map(|time| time.format(TIME_FORMAT).to_string()),
        end_time: task.end_time.map(|time| time.format(TIME_FORMAT).to_string()),
        is_done: task.is_done,
        location: task.location.clone(),
        note: task.note.clone(),
        priority: u8::from(task.priority),
        color_hex: task.color_hex.clone(),
    }
}

fn from_task_item(item: &TaskItem) -> Result<Task, String> {
    let priority = Priority::try_from(item.priority).map_err(|err| {
        warn!("event=ffi_task_decode module=ffi status=rejected error_code=invalid_priority");
        format!("invalid priority `{}`: {err}", item.priority)
    })?;
    Ok(Task {
        id: parse_task_id(&item.id)?,
        title: item.title.clone(),
        date: item.date.as_deref().map(parse_date).transpose()?,
        start_time: item.start_time.as_deref().map(parse_time).transpose()?,
        end_time: item.end_time.as_deref().map(parse_time).transpose()?,
        is_done: item.is_done,
        location: item.location.clone(),
        note: item.note.clone(),
        priority,
        color_hex: item.color_hex.clone(),
    })
}

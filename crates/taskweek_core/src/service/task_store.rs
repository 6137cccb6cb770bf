//! Authoritative task collection with snapshot persistence.
//!
//! # Responsibility
//! - Own the in-memory task collection in insertion order.
//! - Mirror the full collection to key-value storage as one JSON array.
//! - Notify subscribers after every committed change.
//!
//! # Invariants
//! - Task IDs are unique within the collection.
//! - A mutation is committed in memory only after its snapshot write
//!   succeeded; a failed write leaves state and subscribers untouched.
//! - Loading never fails: missing or undecodable snapshots are replaced by
//!   the sample tasks.
//! - Update/delete of an unknown ID is a silent no-op.

use crate::model::task::{Priority, Task, TaskId};
use crate::query::calendar::{start_of_day, today, WeekStart};
use crate::query::task_query::{tasks_for_day, tasks_for_week};
use crate::repo::kv_repo::{KeyValueRepository, RepoError};
use crate::service::subscribers::{SubscriberRegistry, SubscriptionId, TaskListener};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Storage key of the persisted task array.
pub const TASKS_SNAPSHOT_KEY: &str = "SavedTasks";

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure to write the task snapshot.
#[derive(Debug)]
pub enum StoreError {
    Repo(RepoError),
    Encode(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode task snapshot: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// How the collection was obtained by the last load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A stored snapshot was decoded.
    Restored { count: usize },
    /// No snapshot existed; sample tasks were written.
    Seeded,
    /// A snapshot existed but could not be decoded; it was overwritten with
    /// sample tasks.
    ResetAfterCorruption,
}

impl LoadOutcome {
    fn label(self) -> &'static str {
        match self {
            Self::Restored { .. } => "restored",
            Self::Seeded => "seeded",
            Self::ResetAfterCorruption => "reset_after_corruption",
        }
    }
}

enum SnapshotRead {
    Decoded(Vec<Task>),
    Missing,
    Corrupt,
}

/// Task store over a key-value repository.
pub struct TaskStore<R: KeyValueRepository> {
    repo: R,
    tasks: Vec<Task>,
    week_start: WeekStart,
    subscribers: SubscriberRegistry,
    last_load_outcome: LoadOutcome,
}

impl<R: KeyValueRepository> TaskStore<R> {
    /// Creates a store and loads it, seeding sample tasks for today when
    /// needed.
    pub fn open(repo: R) -> Self {
        Self::open_on(repo, today())
    }

    /// Same as `open`, with an explicit "today" for seeded tasks.
    pub fn open_on(repo: R, today: NaiveDate) -> Self {
        let mut store = Self {
            repo,
            tasks: Vec::new(),
            week_start: WeekStart::default(),
            subscribers: SubscriberRegistry::new(),
            last_load_outcome: LoadOutcome::Seeded,
        };
        store.load_on(today);
        store
    }

    /// Sets the week-start rule used by `tasks_for_week`.
    pub fn with_week_start(mut self, week_start: WeekStart) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    /// Reloads the collection from storage.
    ///
    /// Never fails; see `LoadOutcome` for what happened.
    pub fn load(&mut self) -> LoadOutcome {
        self.load_on(today())
    }

    /// Same as `load`, with an explicit "today" for seeded tasks.
    pub fn load_on(&mut self, today: NaiveDate) -> LoadOutcome {
        let outcome = match self.read_snapshot() {
            SnapshotRead::Decoded(tasks) => {
                let tasks = dedupe_by_id(tasks);
                let count = tasks.len();
                self.commit(tasks);
                LoadOutcome::Restored { count }
            }
            SnapshotRead::Missing => {
                self.seed(today);
                LoadOutcome::Seeded
            }
            SnapshotRead::Corrupt => {
                self.seed(today);
                LoadOutcome::ResetAfterCorruption
            }
        };

        info!(
            "event=tasks_load module=store status=ok outcome={} count={}",
            outcome.label(),
            self.tasks.len()
        );
        self.last_load_outcome = outcome;
        outcome
    }

    pub fn last_load_outcome(&self) -> LoadOutcome {
        self.last_load_outcome
    }

    /// Current collection in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Owned copy of the current collection.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Appends a default "New Task" on `date` and persists.
    ///
    /// Returns the created task.
    pub fn add_task(&mut self, date: NaiveDate) -> StoreResult<Task> {
        let task = Task::new_on(date);
        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.write_and_commit("task_add", next)?;
        info!(
            "event=task_add module=store status=ok task_id={} count={}",
            task.id,
            self.tasks.len()
        );
        Ok(task)
    }

    /// Same as `add_task`, truncating `instant` to its calendar day.
    pub fn add_task_at<Tz: TimeZone>(&mut self, instant: &DateTime<Tz>) -> StoreResult<Task> {
        self.add_task(start_of_day(instant))
    }

    /// Replaces the stored task with the same ID, keeping its position.
    ///
    /// Returns `Ok(false)` without writing when the ID is unknown.
    pub fn update_task(&mut self, task: &Task) -> StoreResult<bool> {
        let Some(index) = self.position(task.id) else {
            debug!(
                "event=task_update module=store status=skipped reason=not_found task_id={}",
                task.id
            );
            return Ok(false);
        };

        let mut next = self.tasks.clone();
        next[index] = task.clone();
        self.write_and_commit("task_update", next)?;
        info!(
            "event=task_update module=store status=ok task_id={}",
            task.id
        );
        Ok(true)
    }

    /// Removes the task with the same ID as `task`.
    pub fn delete_task(&mut self, task: &Task) -> StoreResult<bool> {
        self.delete_task_by_id(task.id)
    }

    /// Removes the task with `id`.
    ///
    /// Returns `Ok(false)` without writing when the ID is unknown.
    pub fn delete_task_by_id(&mut self, id: TaskId) -> StoreResult<bool> {
        let Some(index) = self.position(id) else {
            debug!(
                "event=task_delete module=store status=skipped reason=not_found task_id={}",
                id
            );
            return Ok(false);
        };

        let mut next = self.tasks.clone();
        next.remove(index);
        self.write_and_commit("task_delete", next)?;
        info!(
            "event=task_delete module=store status=ok task_id={} count={}",
            id,
            self.tasks.len()
        );
        Ok(true)
    }

    /// Writes the current collection, overwriting the stored snapshot.
    pub fn persist(&self) -> StoreResult<()> {
        self.write_snapshot(&self.tasks)
    }

    /// Registers a listener and immediately delivers the current collection.
    pub fn subscribe(&mut self, listener: TaskListener) -> SubscriptionId {
        let id = self.subscribers.subscribe(listener);
        self.subscribers.notify_one(id, &self.tasks);
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Tasks on `day`, ordered by start time.
    pub fn tasks_for_day(&self, day: NaiveDate) -> Vec<Task> {
        tasks_for_day(&self.tasks, day)
    }

    /// Tasks in the week containing `reference` (today when `None`).
    pub fn tasks_for_week(&self, reference: Option<NaiveDate>) -> Vec<Task> {
        tasks_for_week(&self.tasks, reference, self.week_start)
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn read_snapshot(&self) -> SnapshotRead {
        let raw = match self.repo.get(TASKS_SNAPSHOT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return SnapshotRead::Missing,
            Err(err) => {
                error!(
                    "event=tasks_load module=store status=error error_code=snapshot_read_failed error={}",
                    err
                );
                return SnapshotRead::Missing;
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => SnapshotRead::Decoded(tasks),
            Err(err) => {
                // Decoder errors carry positions only, never snapshot text.
                error!(
                    "event=tasks_load module=store status=error error_code=snapshot_decode_failed error={}",
                    err
                );
                SnapshotRead::Corrupt
            }
        }
    }

    fn seed(&mut self, today: NaiveDate) {
        let tasks = sample_tasks(today);
        if let Err(err) = self.write_snapshot(&tasks) {
            // Seeds stay in memory even when unpersisted.
            error!(
                "event=tasks_seed module=store status=error error_code=snapshot_write_failed error={}",
                err
            );
        }
        self.commit(tasks);
    }

    fn write_and_commit(&mut self, event: &'static str, next: Vec<Task>) -> StoreResult<()> {
        if let Err(err) = self.write_snapshot(&next) {
            error!(
                "event={} module=store status=error error_code=snapshot_write_failed error={}",
                event, err
            );
            return Err(err);
        }
        self.commit(next);
        Ok(())
    }

    fn write_snapshot(&self, tasks: &[Task]) -> StoreResult<()> {
        let encoded = serde_json::to_string(tasks)?;
        self.repo.put(TASKS_SNAPSHOT_KEY, &encoded)?;
        Ok(())
    }

    fn commit(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.subscribers.publish(&self.tasks);
    }
}

/// Sample tasks written on first launch or after a corrupt snapshot.
pub fn sample_tasks(today: NaiveDate) -> Vec<Task> {
    let mut meeting = Task::with_id(Uuid::new_v4(), "Morning Meeting");
    meeting.date = Some(today);
    meeting.start_time = NaiveTime::from_hms_opt(9, 0, 0);
    meeting.end_time = NaiveTime::from_hms_opt(10, 0, 0);
    meeting.location = Some("Office".to_string());
    meeting.priority = Priority::High;
    meeting.color_hex = "#4F8EF7".to_string();

    let mut lunch = Task::with_id(Uuid::new_v4(), "Lunch with Team");
    lunch.date = Some(today);
    lunch.start_time = NaiveTime::from_hms_opt(12, 30, 0);
    lunch.end_time = NaiveTime::from_hms_opt(14, 0, 0);
    lunch.location = Some("Restaurant".to_string());
    lunch.priority = Priority::Medium;
    lunch.color_hex = "#34C759".to_string();

    vec![meeting, lunch]
}

fn dedupe_by_id(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::with_capacity(tasks.len());
    let total = tasks.len();
    let unique = tasks
        .into_iter()
        .filter(|task| seen.insert(task.id))
        .collect::<Vec<_>>();
    if unique.len() != total {
        warn!(
            "event=tasks_load module=store status=degraded reason=duplicate_ids dropped={}",
            total - unique.len()
        );
    }
    unique
}

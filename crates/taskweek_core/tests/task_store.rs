use chrono::{Days, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use taskweek_core::db::open_db_in_memory;
use taskweek_core::{
    today, KeyValueRepository, LoadOutcome, RepoError, RepoResult, SqliteKvRepository, StoreError,
    Task, TaskStore, TASKS_SNAPSHOT_KEY,
};
use uuid::Uuid;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// In-memory repository whose writes can be switched off.
#[derive(Default)]
struct FlakyRepo {
    entries: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl KeyValueRepository for FlakyRepo {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        if self.fail_writes.get() {
            return Err(RepoError::MissingRequiredTable("kv_entries"));
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<bool> {
        Ok(self.entries.borrow_mut().remove(key).is_some())
    }
}

fn empty_store<'a, 'conn>(
    repo: &'a SqliteKvRepository<'conn>,
) -> TaskStore<&'a SqliteKvRepository<'conn>> {
    repo.put(TASKS_SNAPSHOT_KEY, "[]").unwrap();
    let store = TaskStore::open(repo);
    assert_eq!(store.last_load_outcome(), LoadOutcome::Restored { count: 0 });
    store
}

#[test]
fn fresh_store_seeds_two_sample_tasks_and_reload_reproduces_them() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let today = day(2025, 8, 11);

    let store = TaskStore::open_on(&repo, today);
    assert_eq!(store.last_load_outcome(), LoadOutcome::Seeded);
    let titles = store
        .tasks()
        .iter()
        .map(|task| task.title.as_deref().unwrap_or(""))
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Morning Meeting", "Lunch with Team"]);
    assert!(store.tasks().iter().all(|task| task.date == Some(today)));

    let seeded = store.snapshot();
    let reloaded = TaskStore::open_on(&repo, day(2030, 1, 1));
    assert_eq!(
        reloaded.last_load_outcome(),
        LoadOutcome::Restored { count: 2 }
    );
    assert_eq!(reloaded.len(), 2);
    for (left, right) in seeded.iter().zip(reloaded.tasks()) {
        assert!(left.same_fields(right));
    }
}

#[test]
fn corrupt_snapshot_is_reset_to_samples_and_rewritten() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    repo.put(TASKS_SNAPSHOT_KEY, "{not json").unwrap();

    let store = TaskStore::open_on(&repo, day(2025, 8, 11));
    assert_eq!(
        store.last_load_outcome(),
        LoadOutcome::ResetAfterCorruption
    );
    assert_eq!(store.len(), 2);

    let raw = repo.get(TASKS_SNAPSHOT_KEY).unwrap().unwrap();
    let stored: Vec<Task> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.len(), 2);
}

#[test]
fn load_drops_duplicate_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let task = Task::with_id(Uuid::new_v4(), "twice");
    let snapshot = serde_json::to_string(&vec![task.clone(), task]).unwrap();
    repo.put(TASKS_SNAPSHOT_KEY, &snapshot).unwrap();

    let store = TaskStore::open(&repo);
    assert_eq!(store.last_load_outcome(), LoadOutcome::Restored { count: 1 });
}

#[test]
fn add_task_appends_unique_tasks_and_persists_each_call() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut store = empty_store(&repo);

    for offset in 0..5 {
        store.add_task(day(2024, 3, 4 + offset)).unwrap();
    }

    assert_eq!(store.len(), 5);
    let ids = store.tasks().iter().map(|task| task.id).collect::<HashSet<_>>();
    assert_eq!(ids.len(), 5);
    let dates = store
        .tasks()
        .iter()
        .map(|task| task.date)
        .collect::<Vec<_>>();
    assert_eq!(dates[0], Some(day(2024, 3, 4)));
    assert_eq!(dates[4], Some(day(2024, 3, 8)));

    let reloaded = TaskStore::open(&repo);
    assert_eq!(reloaded.len(), 5);
}

#[test]
fn add_task_then_tasks_for_day_returns_only_the_new_task() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut store = TaskStore::open_on(&repo, day(2025, 1, 1));

    let created = store.add_task(day(2024, 3, 10)).unwrap();

    let on_day = store.tasks_for_day(day(2024, 3, 10));
    assert_eq!(on_day.len(), 1);
    assert_eq!(on_day[0].id, created.id);
    assert_eq!(on_day[0].title.as_deref(), Some("New Task"));
    assert!(!on_day[0].is_done);
}

#[test]
fn add_task_at_truncates_instant_to_its_day() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut store = empty_store(&repo);
    let zone = FixedOffset::west_opt(5 * 3600).unwrap();
    let instant = zone.with_ymd_and_hms(2024, 3, 10, 23, 45, 0).unwrap();

    let created = store.add_task_at(&instant).unwrap();
    assert_eq!(created.date, Some(day(2024, 3, 10)));
}

#[test]
fn update_task_replaces_in_place_and_changes_only_edited_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let today = day(2025, 8, 11);
    let mut store = TaskStore::open_on(&repo, today);

    let original = store.tasks()[0].clone();
    let mut toggled = original.clone();
    toggled.is_done = true;
    assert!(store.update_task(&toggled).unwrap());

    let stored = &store.tasks()[0];
    assert!(stored.is_done);
    let mut expected = original.clone();
    expected.is_done = true;
    assert!(stored.same_fields(&expected));

    let on_day = store.tasks_for_day(today);
    let seen = on_day.iter().find(|task| task.id == original.id).unwrap();
    assert!(seen.is_done);

    let reloaded = TaskStore::open(&repo);
    assert!(reloaded.get(original.id).unwrap().is_done);
}

#[test]
fn update_task_with_unknown_id_leaves_collection_and_snapshot_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut store = TaskStore::open_on(&repo, day(2025, 8, 11));
    let before = store.snapshot();
    let raw_before = repo.get(TASKS_SNAPSHOT_KEY).unwrap();

    let stranger = Task::new_on(day(2025, 8, 11));
    assert!(!store.update_task(&stranger).unwrap());

    assert_eq!(store.len(), before.len());
    for (left, right) in before.iter().zip(store.tasks()) {
        assert!(left.same_fields(right));
    }
    assert_eq!(repo.get(TASKS_SNAPSHOT_KEY).unwrap(), raw_before);
}

#[test]
fn delete_task_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut store = TaskStore::open_on(&repo, day(2025, 8, 11));
    let victim = store.tasks()[0].clone();

    assert!(store.delete_task(&victim).unwrap());
    assert!(!store.delete_task(&victim).unwrap());
    assert!(!store.delete_task_by_id(victim.id).unwrap());

    assert_eq!(store.len(), 1);
    assert!(store.get(victim.id).is_none());
    assert_eq!(TaskStore::open(&repo).len(), 1);
}

#[test]
fn removed_snapshot_reseeds_on_next_load() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut store = empty_store(&repo);

    assert!(repo.remove(TASKS_SNAPSHOT_KEY).unwrap());
    assert_eq!(store.load(), LoadOutcome::Seeded);
    assert_eq!(store.len(), 2);
}

#[test]
fn failed_write_leaves_memory_and_subscribers_untouched() {
    let repo = FlakyRepo::default();
    let mut store = TaskStore::open_on(&repo, day(2025, 8, 11));
    let notifications = Rc::new(Cell::new(0));
    let counter = Rc::clone(&notifications);
    store.subscribe(Box::new(move |_| counter.set(counter.get() + 1)));
    assert_eq!(notifications.get(), 1);

    repo.fail_writes.set(true);
    let err = store.add_task(day(2025, 8, 12)).unwrap_err();
    assert!(matches!(err, StoreError::Repo(_)));

    let mut edited = store.tasks()[0].clone();
    edited.title = Some("changed".to_string());
    assert!(store.update_task(&edited).is_err());
    assert!(store.delete_task(&edited).is_err());

    assert_eq!(store.len(), 2);
    assert_eq!(
        store.tasks()[0].title.as_deref(),
        Some("Morning Meeting")
    );
    assert_eq!(notifications.get(), 1);
}

#[test]
fn subscribers_receive_current_value_and_every_commit_until_unsubscribed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut store = TaskStore::open_on(&repo, day(2025, 8, 11));
    let lengths = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&lengths);
    let subscription = store.subscribe(Box::new(move |tasks| {
        sink.borrow_mut().push(tasks.len());
    }));
    assert_eq!(store.subscriber_count(), 1);

    let created = store.add_task(day(2025, 8, 12)).unwrap();
    store.update_task(&Task::new_on(day(2025, 8, 12))).unwrap();
    store.delete_task(&created).unwrap();
    assert_eq!(*lengths.borrow(), vec![2, 3, 2]);

    assert!(store.unsubscribe(subscription));
    store.add_task(day(2025, 8, 13)).unwrap();
    assert_eq!(*lengths.borrow(), vec![2, 3, 2]);
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn persist_overwrites_snapshot_with_current_collection() {
    let repo = FlakyRepo::default();
    let store = TaskStore::open_on(&repo, day(2025, 8, 11));
    repo.put(TASKS_SNAPSHOT_KEY, "[]").unwrap();

    store.persist().unwrap();

    let raw = repo.get(TASKS_SNAPSHOT_KEY).unwrap().unwrap();
    let stored: Vec<Task> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(
        stored[0].start_time,
        NaiveTime::from_hms_opt(9, 0, 0)
    );
}

#[test]
fn store_week_query_without_reference_covers_seeded_day() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let reference = today();

    let mut store = TaskStore::open_on(&repo, reference);
    let later = store
        .add_task(reference.checked_add_days(Days::new(7)).unwrap())
        .unwrap();

    let week = store.tasks_for_week(None);
    if today() != reference {
        // Clock crossed midnight mid-test.
        return;
    }
    assert_eq!(week.len(), 2);
    assert!(week.iter().all(|task| task.date == Some(reference)));
    assert!(!week.iter().any(|task| task.id == later.id));
}

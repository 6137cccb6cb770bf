//! Date-filtered, ordered views over a task snapshot.
//!
//! # Responsibility
//! - Answer "tasks on day D" and "tasks in the week containing D".
//!
//! # Invariants
//! - Functions never mutate their input and perform no I/O.
//! - Undated tasks are never returned.
//! - Ordering uses stable sorts: equal keys keep snapshot order.
//! - Tasks without `start_time` sort after tasks that have one.

use crate::model::task::Task;
use crate::query::calendar::{today, WeekInterval, WeekStart};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Tasks of one calendar day in one week-strip column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAgenda {
    pub day: NaiveDate,
    pub tasks: Vec<Task>,
}

/// Returns tasks dated `day`, ordered by start time.
pub fn tasks_for_day(tasks: &[Task], day: NaiveDate) -> Vec<Task> {
    let mut selected = tasks
        .iter()
        .filter(|task| task.is_on(day))
        .cloned()
        .collect::<Vec<_>>();
    selected.sort_by(compare_start_time);
    selected
}

/// Returns tasks dated inside the week containing `reference`.
///
/// `reference = None` means today on the local clock. Results are ordered
/// by date, then start time.
pub fn tasks_for_week(
    tasks: &[Task],
    reference: Option<NaiveDate>,
    week_start: WeekStart,
) -> Vec<Task> {
    let interval = WeekInterval::containing(reference.unwrap_or_else(today), week_start);
    tasks_in_week(tasks, &interval)
}

/// Returns tasks dated inside `interval`, ordered by date then start time.
pub fn tasks_in_week(tasks: &[Task], interval: &WeekInterval) -> Vec<Task> {
    let mut selected = tasks
        .iter()
        .filter(|task| task.date.is_some_and(|date| interval.contains(date)))
        .cloned()
        .collect::<Vec<_>>();
    selected.sort_by(|left, right| {
        left.date
            .cmp(&right.date)
            .then_with(|| compare_start_time(left, right))
    });
    selected
}

/// Splits the week containing `reference` into one entry per day.
///
/// Every day of the week is present, including days without tasks.
pub fn week_agenda(tasks: &[Task], reference: NaiveDate, week_start: WeekStart) -> Vec<DayAgenda> {
    WeekInterval::containing(reference, week_start)
        .days()
        .into_iter()
        .map(|day| DayAgenda {
            day,
            tasks: tasks_for_day(tasks, day),
        })
        .collect()
}

fn compare_start_time(left: &Task, right: &Task) -> Ordering {
    match (left.start_time, right.start_time) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

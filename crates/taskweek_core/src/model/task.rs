//! Task domain model.
//!
//! # Responsibility
//! - Define the single schedulable record owned by the task store.
//! - Define the JSON wire shape used by the persisted snapshot.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - Equality and hashing consider `id` only; use `Task::same_fields` to
//!   compare full content.
//! - The model does not enforce non-empty titles or ordered time windows;
//!   those are edit-form rules.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Title assigned by `Task::new_on`.
pub const DEFAULT_TASK_TITLE: &str = "New Task";
/// Colour tag assigned when none is given.
pub const DEFAULT_COLOR_HEX: &str = "#4F8EF7";

static COLOR_HEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?([0-9A-Fa-f]{2})([0-9A-Fa-f]{2})([0-9A-Fa-f]{2})$")
        .expect("valid color hex regex")
});

/// Stable identifier for one task record.
pub type TaskId = Uuid;

/// Task urgency. Serialized as integer `0 | 1 | 2`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Human-readable label.
    pub fn title(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// One-letter indicator shown on compact task cards.
    pub fn badge(self) -> char {
        match self {
            Self::Low => 'L',
            Self::Medium => 'M',
            Self::High => 'H',
        }
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        match value {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = InvalidPriority;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::Medium),
            2 => Ok(Self::High),
            other => Err(InvalidPriority(other)),
        }
    }
}

/// Raw priority value outside `0..=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPriority(pub u8);

impl Display for InvalidPriority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "priority must be 0, 1 or 2, got {}", self.0)
    }
}

impl Error for InvalidPriority {}

/// Parsed colour tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Parses `#RRGGBB` (leading `#` optional, any case).
///
/// Returns `None` for anything else.
pub fn parse_color_hex(value: &str) -> Option<Rgb> {
    let captures = COLOR_HEX_RE.captures(value.trim())?;
    let channel = |index: usize| u8::from_str_radix(&captures[index], 16).ok();
    Some(Rgb {
        r: channel(1)?,
        g: channel(2)?,
        b: channel(3)?,
    })
}

fn default_color_hex() -> String {
    DEFAULT_COLOR_HEX.to_string()
}

/// One schedulable item.
///
/// Field names on the wire are camelCase to stay compatible with existing
/// snapshots (`isDone`, `startTime`, `colorHex`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: Option<String>,
    /// Calendar day in local time. Undated tasks never match date queries.
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    /// Not required to be after `start_time`.
    pub end_time: Option<NaiveTime>,
    pub is_done: bool,
    pub location: Option<String>,
    pub note: Option<String>,
    /// Missing in older snapshots; decodes as `Medium`.
    #[serde(default)]
    pub priority: Priority,
    /// Missing in older snapshots; decodes as `DEFAULT_COLOR_HEX`.
    #[serde(default = "default_color_hex")]
    pub color_hex: String,
}

impl Task {
    /// Creates the default "New Task" record for `date` with a fresh ID.
    pub fn new_on(date: NaiveDate) -> Self {
        let mut task = Self::with_id(Uuid::new_v4(), DEFAULT_TASK_TITLE);
        task.date = Some(date);
        task
    }

    /// Creates an undated task with a caller-provided ID.
    ///
    /// Used by import paths and fixtures where identity already exists.
    pub fn with_id(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            date: None,
            start_time: None,
            end_time: None,
            is_done: false,
            location: None,
            note: None,
            priority: Priority::default(),
            color_hex: default_color_hex(),
        }
    }

    /// Compares every field, unlike `==` which compares IDs only.
    pub fn same_fields(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.date == other.date
            && self.start_time == other.start_time
            && self.end_time == other.end_time
            && self.is_done == other.is_done
            && self.location == other.location
            && self.note == other.note
            && self.priority == other.priority
            && self.color_hex == other.color_hex
    }

    /// Parsed colour tag, or `None` when `color_hex` is malformed.
    pub fn color_rgb(&self) -> Option<Rgb> {
        parse_color_hex(&self.color_hex)
    }

    /// Whether this task belongs to calendar day `day`.
    pub fn is_on(&self, day: NaiveDate) -> bool {
        self.date == Some(day)
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

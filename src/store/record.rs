//! Per-day habit records as reported by the companion app.
//!
//! A [`DayRecord`] is a snapshot of every habit the client knew about on one
//! calendar date. The server never derives or corrects any of these values;
//! it stores and displays exactly what the client asserted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One habit's state within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitEntry {
    /// Display name, compared case-insensitively
    pub name: String,
    /// Completion flag as asserted by the client
    pub completed: bool,
    /// How often the habit was logged that day
    pub count: u32,
    /// Daily goal (a goal of 0 is always satisfied)
    pub goal: u32,
}

impl HabitEntry {
    /// Create a new habit entry.
    pub fn new(name: impl Into<String>, completed: bool, count: u32, goal: u32) -> Self {
        Self {
            name: name.into(),
            completed,
            count,
            goal,
        }
    }

    /// Check whether this entry answers to `name`, ignoring case.
    pub fn matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    /// Progress as a `count/goal` fraction for display.
    pub fn progress(&self) -> String {
        format!("{}/{}", self.count, self.goal)
    }
}

/// All habits for a single calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Calendar date this record belongs to (the storage key)
    pub date: NaiveDate,
    /// Habits in presentation order
    #[serde(default)]
    pub habits: Vec<HabitEntry>,
    /// When the record was last written by a sync, `None` if never synced
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl DayRecord {
    /// A record for a date nothing has been synced for.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            habits: Vec::new(),
            last_updated: None,
        }
    }

    /// Check if the record holds no habits.
    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    /// Number of habits in the record.
    pub fn total(&self) -> usize {
        self.habits.len()
    }

    /// Number of habits flagged as completed.
    pub fn completed_count(&self) -> usize {
        self.habits.iter().filter(|h| h.completed).count()
    }

    /// First habit whose name matches `name` case-insensitively.
    pub fn find(&self, name: &str) -> Option<&HabitEntry> {
        self.habits.iter().find(|h| h.matches(name))
    }

    /// Habits flagged as completed, in presentation order.
    pub fn completed(&self) -> impl Iterator<Item = &HabitEntry> {
        self.habits.iter().filter(|h| h.completed)
    }

    /// Habits not yet completed, in presentation order.
    pub fn pending(&self) -> impl Iterator<Item = &HabitEntry> {
        self.habits.iter().filter(|h| !h.completed)
    }

    /// Names of all habits, in presentation order.
    pub fn names(&self) -> Vec<&str> {
        self.habits.iter().map(|h| h.name.as_str()).collect()
    }
}

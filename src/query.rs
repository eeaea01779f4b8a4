//! Point and range queries over the record store.
//!
//! The engine keeps no state of its own: every call goes back to the store,
//! so answers always reflect the most recent sync.

use crate::store::{DayRecord, HabitEntry, RecordStore, StoreError};
use chrono::{Days, NaiveDate};

/// Completion status of a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    /// Every habit completed
    AllDone,
    /// Some, but not all, habits completed
    PartialDone,
    /// Habits were synced but none completed
    NoneDone,
    /// Nothing synced for the day
    NoData,
}

impl DayStatus {
    /// Classify a day record.
    pub fn of(record: &DayRecord) -> Self {
        let total = record.total();
        let completed = record.completed_count();

        if total == 0 {
            DayStatus::NoData
        } else if completed == total {
            DayStatus::AllDone
        } else if completed == 0 {
            DayStatus::NoneDone
        } else {
            DayStatus::PartialDone
        }
    }
}

/// Outcome of looking up a habit by name on a given day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitLookup {
    /// First habit matching the name
    Found(HabitEntry),
    /// The day has habits, but none with that name
    NotFound { available: Vec<String> },
    /// Nothing synced for the day
    NoData,
}

/// A run of consecutive days ending at the newest one, oldest first.
pub type Window = Vec<(NaiveDate, DayRecord)>;

/// Aggregates over a window of days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowStats {
    /// Number of days in the window
    pub days: usize,
    /// Days with at least one synced habit
    pub days_with_data: usize,
    /// Days where every habit was completed
    pub all_done_days: usize,
    /// Completed habits summed over all days
    pub completed: usize,
    /// Habits summed over all days
    pub total: usize,
    /// Consecutive all-done days ending at the newest day
    pub current_run: usize,
}

impl WindowStats {
    /// Compute statistics for a window ordered oldest first.
    pub fn of(window: &[(NaiveDate, DayRecord)]) -> Self {
        let mut stats = WindowStats {
            days: window.len(),
            ..Default::default()
        };

        for (_, record) in window {
            let status = DayStatus::of(record);
            if status != DayStatus::NoData {
                stats.days_with_data += 1;
            }
            if status == DayStatus::AllDone {
                stats.all_done_days += 1;
            }
            stats.completed += record.completed_count();
            stats.total += record.total();
        }

        stats.current_run = window
            .iter()
            .rev()
            .take_while(|(_, record)| DayStatus::of(record) == DayStatus::AllDone)
            .count();

        stats
    }
}

/// Answers habit queries by reading from a [`RecordStore`].
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: RecordStore,
}

impl QueryEngine {
    /// Create a query engine over `store`.
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// The record for a single day.
    pub async fn get_day(&self, date: NaiveDate) -> Result<DayRecord, StoreError> {
        self.store.read(date).await
    }

    /// The `num_days` days ending at `end`, oldest first.
    ///
    /// Days without data are included with an empty habit list. Days before
    /// the earliest representable date are left out.
    pub async fn get_window(&self, end: NaiveDate, num_days: u32) -> Result<Window, StoreError> {
        let mut window = Vec::with_capacity(num_days as usize);

        for offset in (0..num_days).rev() {
            let Some(date) = end.checked_sub_days(Days::new(u64::from(offset))) else {
                continue;
            };
            let record = self.store.read(date).await?;
            window.push((date, record));
        }

        Ok(window)
    }

    /// Look up a habit by name (case-insensitive, first match wins).
    pub async fn find_habit(&self, date: NaiveDate, name: &str) -> Result<HabitLookup, StoreError> {
        let record = self.store.read(date).await?;

        if record.is_empty() {
            return Ok(HabitLookup::NoData);
        }

        if let Some(habit) = record.find(name) {
            return Ok(HabitLookup::Found(habit.clone()));
        }

        Ok(HabitLookup::NotFound {
            available: record.habits.into_iter().map(|h| h.name).collect(),
        })
    }
}

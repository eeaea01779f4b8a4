//! Habit record storage.
//!
//! This module contains:
//! - The per-day record model synced from the companion app
//! - A file-backed store holding one JSON document per date

pub mod file;
pub mod record;

// Re-export commonly used types
pub use file::{RecordStore, StoreError};
pub use record::{DayRecord, HabitEntry};

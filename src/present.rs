//! Text rendering for habit queries.
//!
//! Everything here is a pure function of its inputs. The reference date
//! `today` is always passed in, so the same inputs give the same text.

use crate::query::{DayStatus, HabitLookup, WindowStats};
use crate::store::DayRecord;
use chrono::{Days, NaiveDate};

/// Reply for a habit check without a name.
pub const MISSING_HABIT_NAME: &str = "Please provide a habit name.";

/// How a date relates to `today`, for use inside sentences.
fn when(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "today".to_string()
    } else if Some(date) == today.checked_sub_days(Days::new(1)) {
        "yesterday".to_string()
    } else {
        format!("on {}", date.format("%a %d.%m.%Y"))
    }
}

/// Short label for a window line.
fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if Some(date) == today.checked_sub_days(Days::new(1)) {
        "Yesterday".to_string()
    } else {
        date.format("%a %d.%m").to_string()
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Glyph for a day's completion status.
pub fn status_glyph(status: DayStatus) -> &'static str {
    match status {
        DayStatus::AllDone => "🟢",
        DayStatus::PartialDone => "🟡",
        DayStatus::NoneDone => "🔴",
        DayStatus::NoData => "⚪",
    }
}

/// Message for a day nothing has been synced for.
pub fn no_data(date: NaiveDate, today: NaiveDate) -> String {
    format!(
        "No habit data synced yet for {} ({}). Open the app to sync.",
        if date == today { "today" } else { "this day" },
        date.format("%d.%m.%Y")
    )
}

/// Render every habit of one day with its progress.
pub fn render_day(record: &DayRecord, today: NaiveDate) -> String {
    if record.is_empty() {
        return no_data(record.date, today);
    }

    let mut out = format!(
        "📅 Habits for {} ({}):\n\n",
        if record.date == today {
            "today".to_string()
        } else {
            record.date.format("%A").to_string()
        },
        record.date.format("%d.%m.%Y")
    );

    for habit in &record.habits {
        let marker = if habit.completed { "✅" } else { "❌" };
        out.push_str(&format!("{marker} {}: {}\n", habit.name, habit.progress()));
    }

    out.push_str(&format!(
        "\n📊 Total: {}/{} completed",
        record.completed_count(),
        record.total()
    ));

    out
}

/// Render one line per day of a window, oldest first, plus a footer.
pub fn render_window(window: &[(NaiveDate, DayRecord)], today: NaiveDate) -> String {
    let mut out = if window.len() == 7 {
        "📅 Weekly overview:\n\n".to_string()
    } else {
        format!("📅 Last {}:\n\n", plural(window.len(), "day"))
    };

    for (date, record) in window {
        let status = DayStatus::of(record);
        let label = day_label(*date, today);
        match status {
            DayStatus::NoData => {
                out.push_str(&format!("{} {label}: no data\n", status_glyph(status)));
            }
            _ => {
                out.push_str(&format!(
                    "{} {label}: {}/{}\n",
                    status_glyph(status),
                    record.completed_count(),
                    record.total()
                ));
            }
        }
    }

    let stats = WindowStats::of(window);
    if stats.days_with_data > 0 {
        out.push_str(&format!(
            "\n📊 All habits done on {} of {} ({}/{} habit completions)",
            stats.all_done_days,
            plural(stats.days, "day"),
            stats.completed,
            stats.total
        ));
        if stats.current_run > 1 {
            out.push_str(&format!("\n🔥 {}-day run", stats.current_run));
        }
    }

    out
}

/// Render the outcome of checking a single habit.
pub fn render_check(lookup: &HabitLookup, query: &str, date: NaiveDate, today: NaiveDate) -> String {
    match lookup {
        HabitLookup::NoData => format!("No habit data found for {}.", when(date, today)),
        HabitLookup::NotFound { available } => format!(
            "Habit '{query}' not found. Available habits: {}",
            available.join(", ")
        ),
        HabitLookup::Found(habit) if habit.completed => format!(
            "✅ Yes, '{}' was completed {} ({}).",
            habit.name,
            when(date, today),
            habit.progress()
        ),
        HabitLookup::Found(habit) => format!(
            "❌ No, '{}' was not completed {} ({}).",
            habit.name,
            when(date, today),
            habit.progress()
        ),
    }
}

/// Render a conversational summary of one day.
pub fn render_summary(record: &DayRecord, today: NaiveDate) -> String {
    let total = record.total();
    let completed = record.completed_count();
    let when = when(record.date, today);

    if total == 0 {
        return format!("I don't have any habit data for {when}. Have you opened the app yet?");
    }

    if completed == total {
        return format!(
            "🎉 All {} completed {when}! Well done.",
            plural(total, "habit")
        );
    }

    if completed == 0 {
        return format!(
            "You haven't completed any habits {when}. Pending: {}",
            join_names(record.pending().map(|h| h.name.as_str()))
        );
    }

    format!(
        "You've completed {completed} of {} {when}.\n✅ Done: {}\n❌ Pending: {}",
        plural(total, "habit"),
        join_names(record.completed().map(|h| h.name.as_str())),
        join_names(record.pending().map(|h| h.name.as_str()))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::HabitEntry;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn day(date_str: &str, habits: Vec<HabitEntry>) -> DayRecord {
        DayRecord {
            date: date(date_str),
            habits,
            last_updated: None,
        }
    }

    fn mixed() -> DayRecord {
        day(
            "2024-01-10",
            vec![
                HabitEntry::new("Exercise", true, 1, 1),
                HabitEntry::new("Read", false, 0, 1),
            ],
        )
    }

    #[test]
    fn test_render_day() {
        let text = render_day(&mixed(), date("2024-01-10"));

        assert_eq!(
            text,
            "📅 Habits for today (10.01.2024):\n\n\
             ✅ Exercise: 1/1\n\
             ❌ Read: 0/1\n\
             \n📊 Total: 1/2 completed"
        );
    }

    #[test]
    fn test_render_day_without_habits() {
        let text = render_day(&day("2024-02-02", vec![]), date("2024-02-02"));
        assert!(text.contains("No habit data synced yet for today"));
        assert!(!text.contains("Total"));
    }

    #[test]
    fn test_render_day_zero_goal() {
        let record = day("2024-01-10", vec![HabitEntry::new("Rest", true, 0, 0)]);
        let text = render_day(&record, date("2024-01-12"));
        assert!(text.starts_with("📅 Habits for Wednesday (10.01.2024)"));
        assert!(text.contains("✅ Rest: 0/0"));
    }

    #[test]
    fn test_render_window() {
        let today = date("2024-02-03");
        let window = vec![
            (
                date("2024-01-31"),
                day("2024-01-31", vec![HabitEntry::new("Read", false, 0, 1)]),
            ),
            (
                date("2024-02-01"),
                day("2024-02-01", vec![HabitEntry::new("Read", true, 1, 1)]),
            ),
            (date("2024-02-02"), day("2024-02-02", vec![])),
            (date("2024-02-03"), mixed()),
        ];

        let text = render_window(&window, today);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "📅 Last 4 days:");
        assert_eq!(lines[2], "🔴 Wed 31.01: 0/1");
        assert_eq!(lines[3], "🟢 Thu 01.02: 1/1");
        assert_eq!(lines[4], "⚪ Yesterday: no data");
        assert_eq!(lines[5], "🟡 Today: 1/2");
        assert!(text.contains("All habits done on 1 of 4 days (2/4 habit completions)"));
        assert!(!text.contains("run"));
    }

    #[test]
    fn test_render_window_without_any_data() {
        let today = date("2024-02-03");
        let window: Vec<(NaiveDate, DayRecord)> = (0..7)
            .rev()
            .map(|i| {
                let d = today - Days::new(i);
                (d, DayRecord::empty(d))
            })
            .collect();

        let text = render_window(&window, today);
        assert!(text.starts_with("📅 Weekly overview:"));
        assert_eq!(text.matches("⚪").count(), 7);
        assert!(!text.contains("📊"));
    }

    #[test]
    fn test_render_check_outcomes() {
        let today = date("2024-01-10");
        let record = mixed();

        let done = HabitLookup::Found(record.habits[0].clone());
        assert_eq!(
            render_check(&done, "exercise", today, today),
            "✅ Yes, 'Exercise' was completed today (1/1)."
        );

        let pending = HabitLookup::Found(record.habits[1].clone());
        assert_eq!(
            render_check(&pending, "read", today, today),
            "❌ No, 'Read' was not completed today (0/1)."
        );

        let missing = HabitLookup::NotFound {
            available: vec!["Exercise".to_string(), "Read".to_string()],
        };
        assert_eq!(
            render_check(&missing, "Excercise", today, today),
            "Habit 'Excercise' not found. Available habits: Exercise, Read"
        );

        assert_eq!(
            render_check(&HabitLookup::NoData, "Read", date("2024-01-09"), today),
            "No habit data found for yesterday."
        );
    }

    #[test]
    fn test_summary_tiers() {
        let today = date("2024-01-10");

        let partial = render_summary(&mixed(), today);
        assert_eq!(
            partial,
            "You've completed 1 of 2 habits today.\n✅ Done: Exercise\n❌ Pending: Read"
        );

        let all = day(
            "2024-01-10",
            vec![
                HabitEntry::new("Exercise", true, 1, 1),
                HabitEntry::new("Read", true, 1, 1),
            ],
        );
        assert_eq!(
            render_summary(&all, today),
            "🎉 All 2 habits completed today! Well done."
        );

        let none = day(
            "2024-01-10",
            vec![
                HabitEntry::new("Exercise", false, 0, 1),
                HabitEntry::new("Read", false, 0, 1),
            ],
        );
        assert_eq!(
            render_summary(&none, today),
            "You haven't completed any habits today. Pending: Exercise, Read"
        );
    }

    #[test]
    fn test_summary_without_habits_is_not_the_none_tier() {
        let text = render_summary(&day("2024-01-10", vec![]), date("2024-01-10"));
        assert!(text.contains("don't have any habit data"));
        assert!(!text.contains("Pending"));
    }

    #[test]
    fn test_summary_for_past_day() {
        let text = render_summary(&mixed(), date("2024-01-20"));
        assert!(text.starts_with("You've completed 1 of 2 habits on Wed 10.01.2024."));
    }
}

//! Assistant-facing habit tools.
//!
//! The set of tools is fixed at compile time. [`ToolRegistry`] is built once
//! at startup and shared by reference with whatever transport serves the
//! tools (the stdio server in [`crate::mcp`] or the CLI).

use crate::present;
use crate::query::QueryEngine;
use crate::store::StoreError;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Default number of days in a window query.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Upper bound for the `days` argument of `habits_week`.
pub const MAX_WINDOW_DAYS: u32 = 31;

/// Errors from invoking a tool.
///
/// Outcomes like an unknown habit or a day without data are not errors;
/// they are rendered as text.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with that name
    #[error("Unknown tool: {0}")]
    UnknownOperation(String),
    /// The record store failed underneath the tool
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The habit tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitTool {
    Today,
    Week,
    Check,
    Summary,
}

impl HabitTool {
    /// Every tool, in discovery order.
    pub const ALL: [HabitTool; 4] = [
        HabitTool::Today,
        HabitTool::Week,
        HabitTool::Check,
        HabitTool::Summary,
    ];

    /// Wire name of the tool.
    pub fn name(self) -> &'static str {
        match self {
            HabitTool::Today => "habits_today",
            HabitTool::Week => "habits_week",
            HabitTool::Check => "habits_check",
            HabitTool::Summary => "habits_summary",
        }
    }

    /// Look up a tool by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    /// Human-readable description shown to assistants.
    pub fn description(self) -> &'static str {
        match self {
            HabitTool::Today => {
                "Get all habits and their completion status for today. Returns a list of habits \
                 with name, completed status, count, and daily goal."
            }
            HabitTool::Week => {
                "Get habit completion overview for the past 7 days. Shows which days had all \
                 habits completed."
            }
            HabitTool::Check => "Check if a specific habit was completed today",
            HabitTool::Summary => "Get a natural language summary of today's habit progress",
        }
    }

    /// JSON Schema describing the tool's arguments.
    pub fn input_schema(self) -> Value {
        let date = json!({
            "type": "string",
            "format": "date",
            "description": "Day to query as YYYY-MM-DD (defaults to today)"
        });

        match self {
            HabitTool::Today | HabitTool::Summary => json!({
                "type": "object",
                "properties": { "date": date },
                "required": []
            }),
            HabitTool::Week => json!({
                "type": "object",
                "properties": {
                    "date": date,
                    "days": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_WINDOW_DAYS,
                        "description": "Number of days ending at `date` (defaults to 7)"
                    }
                },
                "required": []
            }),
            HabitTool::Check => json!({
                "type": "object",
                "properties": {
                    "habit_name": {
                        "type": "string",
                        "description": "Name of the habit to check (e.g., 'Exercise', 'Meditation')"
                    },
                    "date": date
                },
                "required": ["habit_name"]
            }),
        }
    }
}

/// Discovery entry for one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Maps tool names to habit queries and their rendering.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    engine: QueryEngine,
    specs: Vec<ToolSpec>,
}

impl ToolRegistry {
    /// Build the registry over a query engine.
    pub fn new(engine: QueryEngine) -> Self {
        let specs = HabitTool::ALL
            .into_iter()
            .map(|tool| ToolSpec {
                name: tool.name(),
                description: tool.description(),
                input_schema: tool.input_schema(),
            })
            .collect();

        Self { engine, specs }
    }

    /// All tools with their descriptions and input schemas.
    pub fn list_operations(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Check whether `name` is a known tool.
    pub fn supports(&self, name: &str) -> bool {
        HabitTool::from_name(name).is_some()
    }

    /// Run a tool and return its text output.
    ///
    /// `today` is the caller's notion of the current date; it is the default
    /// for the `date` argument and the reference for relative day names.
    pub async fn invoke(
        &self,
        name: &str,
        args: &Value,
        today: NaiveDate,
    ) -> Result<String, ToolError> {
        let tool = HabitTool::from_name(name)
            .ok_or_else(|| ToolError::UnknownOperation(name.to_string()))?;

        let date = match args.get("date").and_then(Value::as_str) {
            None => today,
            Some(raw) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                Ok(date) => date,
                Err(_) => return Ok(format!("Invalid date '{raw}', expected YYYY-MM-DD.")),
            },
        };

        tracing::debug!("Invoking {} for {}", tool.name(), date);

        let text = match tool {
            HabitTool::Today => {
                let record = self.engine.get_day(date).await?;
                present::render_day(&record, today)
            }
            HabitTool::Week => {
                let days = args
                    .get("days")
                    .and_then(Value::as_u64)
                    .map(|d| d.clamp(1, u64::from(MAX_WINDOW_DAYS)) as u32)
                    .unwrap_or(DEFAULT_WINDOW_DAYS);
                let window = self.engine.get_window(date, days).await?;
                present::render_window(&window, today)
            }
            HabitTool::Check => {
                let habit_name = args
                    .get("habit_name")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or_default();
                if habit_name.is_empty() {
                    return Ok(present::MISSING_HABIT_NAME.to_string());
                }
                let lookup = self.engine.find_habit(date, habit_name).await?;
                present::render_check(&lookup, habit_name, date, today)
            }
            HabitTool::Summary => {
                let record = self.engine.get_day(date).await?;
                present::render_summary(&record, today)
            }
        };

        Ok(text)
    }
}

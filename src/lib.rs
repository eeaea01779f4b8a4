//! Habit Timer Agent - daily habit records for an AI assistant.
//!
//! The companion app pushes the state of every habit for a day to the sync
//! server. An assistant can then ask about them through a small set of
//! tools served over stdio.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Habit Timer Agent                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐                       ┌─────────────┐       │
//! │  │ Sync server │──────────────────────▶│   Record    │       │
//! │  │ (POST /sync)│                       │    Store    │       │
//! │  └─────────────┘                       └─────────────┘       │
//! │                                               ▲              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │ Tool server │──▶│    Tool     │──▶│   Query     │         │
//! │  │   (stdio)   │   │  Registry   │   │   Engine    │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │                           │                                  │
//! │                           ▼                                  │
//! │                    ┌─────────────┐                           │
//! │                    │Presentation │                           │
//! │                    └─────────────┘                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use habit_timer_agent::{HabitEntry, QueryEngine, RecordStore, ToolRegistry};
//! use chrono::NaiveDate;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RecordStore::new("/tmp/habits");
//! let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
//! store.write(today, vec![HabitEntry::new("Exercise", true, 1, 1)]).await?;
//!
//! let tools = ToolRegistry::new(QueryEngine::new(store));
//! let text = tools.invoke("habits_summary", &serde_json::json!({}), today).await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod mcp;
pub mod present;
pub mod query;
pub mod server;
pub mod store;
pub mod tools;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use mcp::McpServer;
pub use query::{DayStatus, HabitLookup, QueryEngine, WindowStats};
pub use server::{ServerConfig, SyncRequest, SyncResponse};
pub use store::{DayRecord, HabitEntry, RecordStore, StoreError};
pub use tools::{HabitTool, ToolError, ToolRegistry, ToolSpec};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

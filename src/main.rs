//! Habit Timer Agent CLI
//!
//! Runs the sync server, the assistant tool server, or answers habit
//! queries directly from the terminal.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use habit_timer_agent::{
    config::{parse_timezone, Config},
    mcp::McpServer,
    present,
    query::{DayStatus, QueryEngine},
    server::{self, ServerConfig},
    store::RecordStore,
    tools::{HabitTool, ToolRegistry, DEFAULT_WINDOW_DAYS},
    VERSION,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "habit-timer")]
#[command(version = VERSION)]
#[command(about = "Daily habit records for an AI assistant", long_about = None)]
struct Cli {
    /// Directory holding one JSON document per day
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// IANA timezone deciding which day is today (e.g. Europe/Berlin)
    #[arg(long, global = true)]
    timezone: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP sync server for the companion app
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },

    /// Serve the habit tools to an assistant over stdio
    Mcp,

    /// Show all habits for a day
    Today {
        /// Day to show (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show an overview of the last days
    Week {
        /// Last day of the overview (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Number of days to show
        #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
        days: u32,
    },

    /// Check whether a habit was completed
    Check {
        /// Habit name (case-insensitive)
        name: String,

        /// Day to check (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Summarize a day's progress
    Summary {
        /// Day to summarize (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List the assistant tools and their input schemas
    Tools,

    /// Show stored days
    Status,

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(config, host, port).await,
        Commands::Mcp => cmd_mcp(config).await,
        Commands::Today { date } => {
            cmd_tool(&config, HabitTool::Today, date_args(date)).await
        }
        Commands::Week { date, days } => {
            let mut args = date_args(date);
            args["days"] = json!(days);
            cmd_tool(&config, HabitTool::Week, args).await
        }
        Commands::Check { name, date } => {
            let mut args = date_args(date);
            args["habit_name"] = json!(name);
            cmd_tool(&config, HabitTool::Check, args).await
        }
        Commands::Summary { date } => {
            cmd_tool(&config, HabitTool::Summary, date_args(date)).await
        }
        Commands::Tools => {
            cmd_tools(&config);
            Ok(())
        }
        Commands::Status => cmd_status(&config).await,
        Commands::Config => cmd_config(&config),
    }
}

/// Log to stderr so stdout stays reserved for tool protocol messages.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration and apply global command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load().context("Failed to load configuration")?;

    if let Some(ref dir) = cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(ref tz) = cli.timezone {
        config.timezone = parse_timezone(tz)?;
    }

    Ok(config)
}

fn registry(config: &Config) -> ToolRegistry {
    ToolRegistry::new(QueryEngine::new(RecordStore::new(config.data_dir.clone())))
}

fn date_args(date: Option<NaiveDate>) -> Value {
    match date {
        Some(date) => json!({ "date": date.format("%Y-%m-%d").to_string() }),
        None => json!({}),
    }
}

async fn cmd_serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let server_config = ServerConfig::from_config(&config)?;
    let (addr, shutdown_tx) = server::run(server_config)
        .await
        .context("Failed to start sync server")?;

    println!("Habit Timer Agent v{VERSION}");
    println!("Sync server listening on http://{addr}");
    println!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    let _ = shutdown_tx.send(());
    Ok(())
}

async fn cmd_mcp(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Serving habit tools over stdio from {:?}",
        config.data_dir
    );

    let server = McpServer::new(registry(&config), config.timezone);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    server
        .serve(stdin, tokio::io::stdout())
        .await
        .context("Tool server I/O failed")?;
    Ok(())
}

async fn cmd_tool(config: &Config, tool: HabitTool, args: Value) -> anyhow::Result<()> {
    let text = registry(config)
        .invoke(tool.name(), &args, config.today())
        .await?;
    println!("{text}");
    Ok(())
}

fn cmd_tools(config: &Config) {
    for spec in registry(config).list_operations() {
        println!("{}", spec.name);
        println!("  {}", spec.description);
        println!(
            "  {}",
            serde_json::to_string(&spec.input_schema).unwrap_or_else(|_| "{}".to_string())
        );
        println!();
    }
}

async fn cmd_status(config: &Config) -> anyhow::Result<()> {
    let store = RecordStore::new(config.data_dir.clone());
    let dates = store.dates().await?;

    println!("Habit Timer Agent Status");
    println!("========================");
    println!();
    println!("Data directory: {:?}", store.root());
    println!("Timezone: {}", config.timezone.name());
    println!("Stored days: {}", dates.len());

    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        println!("  First: {first}");
        println!("  Last: {last}");
    }

    let today = config.today();
    let record = store.read(today).await?;
    println!();
    println!(
        "Today ({today}): {} {}",
        present::status_glyph(DayStatus::of(&record)),
        match record.last_updated {
            Some(ts) => format!(
                "{}/{} completed, last synced {}",
                record.completed_count(),
                record.total(),
                ts.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => "not synced yet".to_string(),
        }
    );

    Ok(())
}

fn cmd_config(config: &Config) -> anyhow::Result<()> {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}

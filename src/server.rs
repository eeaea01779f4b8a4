//! HTTP server for receiving habit data from the companion app.
//!
//! This module provides an HTTP server that:
//! - Accepts the day's habit list from the app via POST /sync
//! - Authenticates it with a shared secret in the `X-API-Key` header
//! - Replaces the stored record for that date
//!
//! # Architecture
//!
//! ```text
//! Companion app ──→ POST /sync ──→ habit-timer ──→ <data_dir>/<date>.json
//!                                                        ↑
//!                                    assistant ──→ tools ┘
//! ```

use crate::config::{Config, ConfigError};
use crate::store::{HabitEntry, RecordStore};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Header carrying the shared sync secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Shared secret expected from the app
    pub api_key: String,
    /// Directory of the record store
    pub data_dir: PathBuf,
    /// Timezone for resolving "today" and timestamp dates
    pub timezone: Tz,
}

impl ServerConfig {
    /// Create a new server configuration bound to localhost, in UTC.
    pub fn new(port: u16, api_key: impl Into<String>, data_dir: PathBuf) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port,
            api_key: api_key.into(),
            data_dir,
            timezone: Tz::UTC,
        }
    }

    /// Build a server configuration from the agent configuration.
    ///
    /// Fails if no API key is configured; the server never runs without one.
    /// A blank key counts as none.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "no sync API key configured (set {})",
                crate::config::ENV_API_KEY
            ))
        })?;

        Ok(Self {
            host: config.host.clone(),
            port: config.port,
            api_key,
            data_dir: config.data_dir.clone(),
            timezone: config.timezone,
        })
    }
}

/// Shared server state
pub struct ServerState {
    /// Record store written by sync requests
    store: RecordStore,
    /// Shared secret
    api_key: String,
    /// Timezone for date resolution
    timezone: Tz,
}

impl ServerState {
    /// Create new server state
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            store: RecordStore::new(config.data_dir.clone()),
            api_key: config.api_key.clone(),
            timezone: config.timezone,
        }
    }

    /// Check the `X-API-Key` header against the shared secret.
    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(API_KEY_HEADER)
            .map(|value| value.as_bytes() == self.api_key.as_bytes())
            .unwrap_or(false)
    }
}

/// Sync payload from the app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Day the habits belong to (defaults to today)
    #[serde(default)]
    pub date: Option<String>,
    /// Full habit list for that day
    pub habits: Vec<HabitEntry>,
}

/// Response from sync endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    pub status: String,
    pub date: String,
    pub habits_count: usize,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

/// Resolve the calendar date of a sync request.
///
/// Accepts `YYYY-MM-DD` as is, or an RFC 3339 timestamp, which is moved into
/// `timezone` before taking its date. A missing or blank value means `today`.
pub fn resolve_sync_date(
    raw: Option<&str>,
    timezone: Tz,
    today: NaiveDate,
) -> Result<NaiveDate, String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(today),
        Some(raw) => raw,
    };

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&timezone).date_naive())
        .map_err(|_| format!("Invalid date '{raw}', expected YYYY-MM-DD or an RFC 3339 timestamp"))
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /sync
///
/// Replaces the stored habits for one day. The API key is checked before the
/// body is even parsed.
async fn sync(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SyncResponse>, ApiError> {
    if !state.authorized(&headers) {
        tracing::warn!("Rejected sync request with invalid API key");
        return Err(api_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Invalid API key",
        ));
    }

    let request: SyncRequest = serde_json::from_slice(&body).map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_BODY",
            format!("Invalid sync payload: {e}"),
        )
    })?;

    if let Some(i) = request.habits.iter().position(|h| h.name.trim().is_empty()) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_HABIT",
            format!("Habit at index {i} has an empty name"),
        ));
    }

    let today = Utc::now().with_timezone(&state.timezone).date_naive();
    let date = resolve_sync_date(request.date.as_deref(), state.timezone, today)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, "INVALID_DATE", e))?;

    let habits_count = request.habits.len();
    state.store.write(date, request.habits).await.map_err(|e| {
        tracing::error!("Failed to store habits for {}: {}", date, e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE_ERROR",
            format!("Failed to store habits: {e}"),
        )
    })?;

    tracing::info!("Synced {} habits for {}", habits_count, date);

    Ok(Json(SyncResponse {
        status: "ok".to_string(),
        date: date.format("%Y-%m-%d").to_string(),
        habits_count,
    }))
}

/// Build the sync router over shared state.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sync", post(sync))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::new(&config));
    let app = router(state);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Habit sync server listening on http://{}", actual_addr);
    tracing::info!("Storing habit data in {:?}", config.data_dir);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}

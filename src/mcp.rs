//! Stdio tool server for AI assistants (Model Context Protocol).
//!
//! Speaks newline-delimited JSON-RPC 2.0. Only the subset needed to list
//! and call tools is implemented: `initialize`, `ping`, `tools/list` and
//! `tools/call`. Notifications are accepted and ignored.
//!
//! Nothing but protocol messages may be written to stdout; logs go to stderr.

use crate::tools::{ToolError, ToolRegistry};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Protocol revision announced in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name announced in `initialize`.
pub const SERVER_NAME: &str = "habit-timer-mcp";

// JSON-RPC error codes
const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const SERVER_ERROR: i64 = -32000;

/// Serves a [`ToolRegistry`] over JSON-RPC.
pub struct McpServer {
    registry: ToolRegistry,
    timezone: Tz,
}

impl McpServer {
    /// Create a server; `timezone` decides which day is "today" for each call.
    pub fn new(registry: ToolRegistry, timezone: Tz) -> Self {
        Self { registry, timezone }
    }

    /// Read requests from `reader` until EOF, writing one response line per request.
    ///
    /// A line that is not valid UTF-8 gets a parse error reply; the loop keeps going.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let today = Utc::now().with_timezone(&self.timezone).date_naive();
            let response = match std::str::from_utf8(&buf) {
                Ok(line) => self.handle_line(line, today).await,
                Err(e) => {
                    tracing::warn!("Request is not valid UTF-8: {}", e);
                    Some(error(Value::Null, PARSE_ERROR, format!("Parse error: {e}")))
                }
            };

            if let Some(response) = response {
                writer.write_all(response.to_string().as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        tracing::info!("Input closed, stopping tool server");
        Ok(())
    }

    /// Handle one raw line. Returns `None` for blank lines and notifications.
    pub async fn handle_line(&self, line: &str, today: NaiveDate) -> Option<Value> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(message) => self.handle(&message, today).await,
            Err(e) => {
                tracing::warn!("Unparsable request: {}", e);
                Some(error(Value::Null, PARSE_ERROR, format!("Parse error: {e}")))
            }
        }
    }

    /// Handle one decoded message.
    pub async fn handle(&self, message: &Value, today: NaiveDate) -> Option<Value> {
        let id = match message.get("id") {
            None | Some(Value::Null) => {
                let method = message
                    .get("method")
                    .and_then(Value::as_str)
                    .unwrap_or("?");
                tracing::debug!("Ignoring notification {}", method);
                return None;
            }
            Some(id) => id.clone(),
        };

        let Some(method) = message.get("method").and_then(Value::as_str) else {
            return Some(error(id, INVALID_REQUEST, "Missing method"));
        };
        let params = message.get("params").cloned().unwrap_or_else(|| json!({}));

        let response = match method {
            "initialize" => success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": { "listChanged": false } },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ),
            "ping" => success(id, json!({})),
            "tools/list" => success(
                id,
                json!({ "tools": self.registry.list_operations() }),
            ),
            "tools/call" => self.call_tool(id, &params, today).await,
            other => error(id, METHOD_NOT_FOUND, format!("Unknown method: {other}")),
        };

        Some(response)
    }

    async fn call_tool(&self, id: Value, params: &Value, today: NaiveDate) -> Value {
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        match self.registry.invoke(name, &arguments, today).await {
            Ok(text) => success(id, text_content(&text, false)),
            Err(e @ ToolError::UnknownOperation(_)) => {
                tracing::warn!("{}", e);
                success(id, text_content(&e.to_string(), true))
            }
            Err(ToolError::Store(e)) => {
                tracing::error!("Tool {} failed: {}", name, e);
                error(id, SERVER_ERROR, format!("Storage error: {e}"))
            }
        }
    }
}

fn text_content(text: &str, is_error: bool) -> Value {
    let mut result = json!({ "content": [ { "type": "text", "text": text } ] });
    if is_error {
        result["isError"] = Value::Bool(true);
    }
    result
}

fn success(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message.into() }
    })
}

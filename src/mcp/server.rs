//! The stdio serve loop: one JSON-RPC frame per line on stdin, one per line
//! on stdout.

use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::AppContext;

use super::dispatch::McpDispatcher;
use super::tools;
use super::transport::{
    handle_initialize, handle_ping, McpRequest, McpResponse, MCP_INTERNAL_ERROR,
    MCP_INVALID_PARAMS, MCP_METHOD_NOT_FOUND, MCP_PARSE_ERROR,
};

/// Run the MCP server until stdin closes.
pub async fn serve(ctx: Arc<AppContext>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    info!("MCP server listening on stdio");
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = handle_message(&ctx, &line).await {
            let mut frame = serde_json::to_string(&response)?;
            frame.push('\n');
            stdout.write_all(frame.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    info!("stdin closed — MCP server shutting down");
    Ok(())
}

/// Handle one incoming frame.  Returns `None` for notifications (which never
/// get a response).
pub async fn handle_message(ctx: &Arc<AppContext>, line: &str) -> Option<McpResponse> {
    let request: McpRequest = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(e) => {
            return Some(McpResponse::err(
                Value::Null,
                MCP_PARSE_ERROR,
                format!("parse error: {e}"),
            ));
        }
    };

    debug!(method = %request.method, "MCP message received");
    let id = request.id.clone();

    match request.method.as_str() {
        "initialize" => Some(McpResponse::ok(id.unwrap_or(Value::Null), handle_initialize())),
        "notifications/initialized" => {
            info!("MCP client initialized");
            None
        }
        "ping" => Some(McpResponse::ok(id.unwrap_or(Value::Null), handle_ping())),
        "tools/list" => Some(McpResponse::ok(
            id.unwrap_or(Value::Null),
            tools::handle_tools_list(),
        )),
        "tools/call" => {
            let id = id.unwrap_or(Value::Null);
            let name = match request.params.get("name").and_then(Value::as_str) {
                Some(name) => name.to_string(),
                None => {
                    return Some(McpResponse::err(
                        id,
                        MCP_INVALID_PARAMS,
                        "tools/call requires a 'name' param",
                    ));
                }
            };
            let arguments = request
                .params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));

            let dispatcher = McpDispatcher::new(ctx.clone());
            match dispatcher.dispatch(&name, arguments).await {
                Ok(result) => Some(McpResponse::ok(
                    id,
                    json!({
                        "content": [{
                            "type": "text",
                            "text": result.to_string(),
                        }]
                    }),
                )),
                Err(e) => Some(map_dispatch_error(id, e)),
            }
        }
        other => {
            // Unknown notifications are dropped; unknown requests get an error.
            id.map(|id| {
                McpResponse::err(id, MCP_METHOD_NOT_FOUND, format!("unknown method: {other}"))
            })
        }
    }
}

/// Map a dispatch error onto a JSON-RPC error code via its message prefix.
fn map_dispatch_error(id: Value, e: anyhow::Error) -> McpResponse {
    let message = format!("{e:#}");
    let code = if message.starts_with("MCP_INVALID_PARAMS:") {
        MCP_INVALID_PARAMS
    } else {
        MCP_INTERNAL_ERROR
    };
    McpResponse::err(id, code, message)
}

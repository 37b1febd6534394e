//! JSON-RPC 2.0 wire types and lifecycle handlers for the MCP transport.
//!
//! One JSON frame per line.  Requests carry an `id`; notifications do not
//! and never receive a response.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// MCP protocol revision implemented by this server.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// ─── Error codes ──────────────────────────────────────────────────────────────

pub const MCP_PARSE_ERROR: i64 = -32700;
pub const MCP_INVALID_REQUEST: i64 = -32600;
pub const MCP_METHOD_NOT_FOUND: i64 = -32601;
pub const MCP_INVALID_PARAMS: i64 = -32602;
pub const MCP_INTERNAL_ERROR: i64 = -32603;

// ─── Wire types ───────────────────────────────────────────────────────────────

/// An incoming JSON-RPC message — request or notification.
#[derive(Debug, Clone, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: Option<String>,
    /// Absent on notifications.
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McpError {
    pub code: i64,
    pub message: String,
}

/// An outgoing JSON-RPC response.
#[derive(Debug, Clone, Serialize)]
pub struct McpResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

impl McpResponse {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(McpError {
                code,
                message: message.into(),
            }),
        }
    }
}

// ─── Lifecycle handlers ───────────────────────────────────────────────────────

/// Handle the `initialize` handshake.  storyd only advertises tools — no
/// resources, no prompts.
pub fn handle_initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": "storyd",
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}

/// Handle `ping` — an empty result is the required reply.
pub fn handle_ping() -> Value {
    json!({})
}

// ─── Tests ────────────────────────────────────────────────────────────────────

//! MCP `tools/list` handler — exposes the storyd evaluation tools as MCP
//! tool definitions.
//!
//! Each tool definition follows the JSON Schema convention for
//! `inputSchema`.  Clients call `tools/list` to discover available tools,
//! then invoke them via `tools/call` (dispatched by `mcp::dispatch`).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ─── Tool definition type ─────────────────────────────────────────────────────

/// A single MCP tool definition, as returned in `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl McpToolDef {
    fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

// ─── Tool catalogue ───────────────────────────────────────────────────────────

/// Returns all storyd tools available via MCP.
///
/// Defined as a function (not a static) because `serde_json::json!` produces
/// a non-`const` `Value`.  The list is small and cheap to allocate.
pub fn storyd_tools() -> Vec<McpToolDef> {
    vec![
        // ── list_categories ───────────────────────────────────────────────────
        McpToolDef::new(
            "list_categories",
            "Return all supported evaluation categories, in evaluation order.",
            json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        ),

        // ── evaluate ──────────────────────────────────────────────────────────
        McpToolDef::new(
            "evaluate",
            "Evaluate a story across all evaluation categories, including a contextual creativity score.",
            json!({
                "type": "object",
                "required": ["story"],
                "properties": {
                    "story": {
                        "type": "string",
                        "description": "The story text to evaluate."
                    }
                },
                "additionalProperties": false
            }),
        ),

        // ── evaluate_creativity ───────────────────────────────────────────────
        McpToolDef::new(
            "evaluate_creativity",
            "Evaluate a story's creativity directly, without category context.",
            json!({
                "type": "object",
                "required": ["story"],
                "properties": {
                    "story": {
                        "type": "string",
                        "description": "The story text to evaluate."
                    }
                },
                "additionalProperties": false
            }),
        ),

        // ── compare_creativity ────────────────────────────────────────────────
        McpToolDef::new(
            "compare_creativity",
            "Score creativity standalone and in category context, then attribute any difference to specific categories.",
            json!({
                "type": "object",
                "required": ["story"],
                "properties": {
                    "story": {
                        "type": "string",
                        "description": "The story text to evaluate."
                    }
                },
                "additionalProperties": false
            }),
        ),

        // ── read_dataset_row ──────────────────────────────────────────────────
        McpToolDef::new(
            "read_dataset_row",
            "Read a single dataset entry by 0-based index. Returns the model name and response text.",
            json!({
                "type": "object",
                "required": ["index"],
                "properties": {
                    "index": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "0-based row index into the loaded dataset."
                    }
                },
                "additionalProperties": false
            }),
        ),

        // ── evaluate_full_dataset ─────────────────────────────────────────────
        McpToolDef::new(
            "evaluate_full_dataset",
            "Evaluate every dataset entry and save the results to a CSV file. Returns the file path and the CSV content.",
            json!({
                "type": "object",
                "properties": {
                    "output_filename": {
                        "type": "string",
                        "description": "Result CSV filename. Defaults to a timestamped name."
                    }
                },
                "additionalProperties": false
            }),
        ),
    ]
}

// ─── tools/list handler ───────────────────────────────────────────────────────

/// Handle a MCP `tools/list` request.
///
/// Returns `{"tools": [...]}` ready to embed in
/// `McpResponse::ok(id, handle_tools_list())`.
pub fn handle_tools_list() -> Value {
    let tools = storyd_tools();
    json!({ "tools": tools })
}

// ─── Tests ────────────────────────────────────────────────────────────────────

//! Model Context Protocol (MCP) server for `storyd`.
//!
//! `storyd` exposes its evaluation tools to MCP clients over stdio using
//! JSON-RPC 2.0.  Logging goes to stderr — stdout carries only protocol
//! frames.
//!
//! ## Protocol version
//! MCP 2024-11-05.
//!
//! ## Submodules
//!
//! | Module | Role |
//! |--------|------|
//! | `transport` | JSON-RPC wire types, lifecycle handlers, error codes |
//! | `tools` | `tools/list` response — the 6 storyd tool definitions |
//! | `dispatch` | `tools/call` dispatcher — routes to the evaluator/dataset/export |
//! | `server` | stdio read/dispatch/respond loop |

pub mod dispatch;
pub mod server;
pub mod tools;
pub mod transport;

// ─── Flat re-exports ──────────────────────────────────────────────────────────

pub use transport::{
    handle_initialize, handle_ping, McpError, McpRequest, McpResponse, MCP_INTERNAL_ERROR,
    MCP_INVALID_PARAMS, MCP_INVALID_REQUEST, MCP_METHOD_NOT_FOUND, MCP_PARSE_ERROR,
    PROTOCOL_VERSION,
};

pub use tools::{handle_tools_list, storyd_tools, McpToolDef};

pub use dispatch::McpDispatcher;

pub use server::{handle_message, serve};

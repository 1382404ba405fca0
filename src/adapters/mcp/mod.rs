//! MCP adapter - the AI-facing wire surface.
//!
//! JSON-RPC 2.0 over HTTP with two methods: `tools/list` advertises the
//! five task tools and their schemas; `tools/call` runs one of them through
//! the validation/authorization/deadline pipeline.

mod dispatcher;
mod envelope;
mod guard;
mod params;
mod registry;

pub use dispatcher::{mcp_router, McpServerState, TaskTools};
pub use envelope::{CallToolResult, JsonRpcRequest, JsonRpcResponse, ToolContent};
pub use guard::ensure_subject_matches;
pub use params::{
    AddTaskParams, CompleteTaskParams, DeleteTaskParams, ListTasksParams, UpdateTaskParams,
};
pub use registry::{ToolKind, ToolRegistry, ToolSpec};

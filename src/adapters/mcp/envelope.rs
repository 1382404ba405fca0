//! JSON-RPC 2.0 envelope and MCP tool result types.
//!
//! Protocol-level failures (malformed request, unknown method) surface as
//! JSON-RPC error objects. Tool-level failures never do: they are carried
//! inside a successful JSON-RPC response as a [`CallToolResult`] with
//! `isError: true`, so an agent can always read a structured `ToolError`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::ToolError;

/// The only supported protocol version.
pub const JSONRPC_VERSION: &str = "2.0";

/// Invalid JSON-RPC request shape.
pub const INVALID_REQUEST: i64 = -32600;

/// Unknown JSON-RPC method (tool names are not methods; an unknown tool is
/// a `validation` tool error instead).
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Incoming JSON-RPC request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC protocol error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// Outgoing JSON-RPC response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Successful response carrying a result.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Protocol-level error response.
    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// One element of a tool result's human-readable content.
#[derive(Debug, Clone, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub text: String,
}

impl ToolContent {
    /// Text content block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text",
            text: text.into(),
        }
    }
}

/// Result envelope of a `tools/call` invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    pub is_error: bool,
}

impl CallToolResult {
    /// Success envelope: structured result plus its JSON rendering as text.
    pub fn success(structured: Value) -> Self {
        let text = structured.to_string();
        Self {
            content: vec![ToolContent::text(text)],
            structured_content: Some(structured),
            is_error: false,
        }
    }

    /// Error envelope: user-safe message as text, full `ToolError` as
    /// structured content.
    pub fn error(err: &ToolError) -> Self {
        let structured = serde_json::to_value(err).unwrap_or_else(|_| {
            serde_json::json!({
                "error_type": err.error_type.as_str(),
                "message": err.message,
            })
        });
        Self {
            content: vec![ToolContent::text(err.message.clone())],
            structured_content: Some(structured),
            is_error: true,
        }
    }
}

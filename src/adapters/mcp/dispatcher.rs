//! MCP dispatcher - transport, routing, and the per-call pipeline.
//!
//! Control flow of one call: the auth middleware verifies the bearer
//! credential and injects the [`Subject`] → the JSON-RPC handler routes
//! `tools/list` / `tools/call` → parameters are validated → the guard
//! reconciles subject and `user_id` → the tool handler runs under the call
//! deadline → the outcome is wrapped in an envelope and logged as a single
//! structured record.
//!
//! One handler call corresponds to exactly one response; there are no
//! partial results.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::application::handlers::task::{
    AddTaskHandler, CompleteTaskHandler, DeleteTaskHandler, ListTasksHandler, UpdateTaskHandler,
};
use crate::domain::foundation::{AuthError, CorrelationId, Subject, ToolError};
use crate::ports::{TaskRepository, TokenVerifier};

use super::envelope::{
    CallToolResult, JsonRpcRequest, JsonRpcResponse, INVALID_REQUEST, JSONRPC_VERSION,
    METHOD_NOT_FOUND,
};
use super::guard::ensure_subject_matches;
use super::params::{
    parse_arguments, AddTaskParams, CompleteTaskParams, DeleteTaskParams, ListTasksParams,
    UpdateTaskParams,
};
use super::registry::{ToolKind, ToolRegistry};

/// The five tool handlers, wired over one repository.
#[derive(Clone)]
pub struct TaskTools {
    add: Arc<AddTaskHandler>,
    list: Arc<ListTasksHandler>,
    complete: Arc<CompleteTaskHandler>,
    update: Arc<UpdateTaskHandler>,
    delete: Arc<DeleteTaskHandler>,
}

impl TaskTools {
    /// Builds all handlers over a shared repository.
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self {
            add: Arc::new(AddTaskHandler::new(repository.clone())),
            list: Arc::new(ListTasksHandler::new(repository.clone())),
            complete: Arc::new(CompleteTaskHandler::new(repository.clone())),
            update: Arc::new(UpdateTaskHandler::new(repository.clone())),
            delete: Arc::new(DeleteTaskHandler::new(repository)),
        }
    }
}

/// Shared state of the MCP endpoint.
#[derive(Clone)]
pub struct McpServerState {
    verifier: Arc<dyn TokenVerifier>,
    registry: Arc<ToolRegistry>,
    tools: TaskTools,
    call_deadline: Duration,
}

impl McpServerState {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        repository: Arc<dyn TaskRepository>,
        call_deadline: Duration,
    ) -> Self {
        Self {
            verifier,
            registry: Arc::new(ToolRegistry::standard()),
            tools: TaskTools::new(repository),
            call_deadline,
        }
    }
}

/// Builds the MCP router: `POST /mcp` behind the credential gate.
pub fn mcp_router(state: McpServerState) -> Router {
    let verifier = state.verifier.clone();
    Router::new()
        .route("/mcp", post(rpc_handler))
        .layer(middleware::from_fn_with_state(verifier, auth_middleware))
        .with_state(state)
}

// ════════════════════════════════════════════════════════════════════════════
// Identity gate
// ════════════════════════════════════════════════════════════════════════════

/// Verifier handle used by the auth middleware.
pub type VerifierState = Arc<dyn TokenVerifier>;

/// Validates the bearer credential and injects the subject.
///
/// Every request to the MCP endpoint must carry `Authorization: Bearer
/// <token>`; anything else is rejected before a handler runs.
async fn auth_middleware(
    State(verifier): State<VerifierState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        tracing::warn!(event = "auth", outcome = "denied", reason = "missing_credential");
        return unauthorized_response("Missing bearer credential");
    };

    match verifier.verify(token).await {
        Ok(subject) => {
            tracing::debug!(event = "auth", outcome = "ok", subject = %subject);
            request.extensions_mut().insert(subject);
            next.run(request).await
        }
        Err(AuthError::TokenExpired) => {
            tracing::warn!(event = "auth", outcome = "denied", reason = "expired");
            unauthorized_response("Token expired")
        }
        Err(AuthError::InvalidToken) => {
            tracing::warn!(event = "auth", outcome = "denied", reason = "invalid");
            unauthorized_response("Invalid token")
        }
        Err(AuthError::ServiceUnavailable(detail)) => {
            tracing::error!(
                event = "auth",
                outcome = "denied",
                reason = "unavailable",
                detail = %detail
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ToolError::internal("Authentication service unavailable")),
            )
                .into_response()
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ToolError::unauthorized(message)),
    )
        .into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// JSON-RPC routing
// ════════════════════════════════════════════════════════════════════════════

/// Parameters of a `tools/call` request.
#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

async fn rpc_handler(
    State(state): State<McpServerState>,
    Extension(subject): Extension<Subject>,
    Json(body): Json<Value>,
) -> Response {
    let request: JsonRpcRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(_) => {
            let response =
                JsonRpcResponse::error(Value::Null, INVALID_REQUEST, "Invalid JSON-RPC request");
            return (StatusCode::OK, Json(response)).into_response();
        }
    };

    let id = request.id.clone().unwrap_or(Value::Null);

    if request.jsonrpc != JSONRPC_VERSION {
        let response =
            JsonRpcResponse::error(id, INVALID_REQUEST, "Unsupported JSON-RPC version");
        return (StatusCode::OK, Json(response)).into_response();
    }

    let response = match request.method.as_str() {
        "tools/list" => JsonRpcResponse::success(id, state.registry.list_payload()),
        "tools/call" => {
            let result = match serde_json::from_value::<CallParams>(request.params) {
                Ok(params) => {
                    dispatch_tool(&state, &subject, &params.name, params.arguments).await
                }
                Err(_) => CallToolResult::error(&ToolError::validation(
                    "params",
                    "tools/call params must include a tool name",
                )),
            };
            match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize tool result");
                    JsonRpcResponse::success(
                        id,
                        serde_json::to_value(CallToolResult::error(&ToolError::internal(
                            "Internal error",
                        )))
                        .unwrap_or(Value::Null),
                    )
                }
            }
        }
        other => {
            JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown method: {}", other))
        }
    };

    (StatusCode::OK, Json(response)).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Tool dispatch
// ════════════════════════════════════════════════════════════════════════════

/// Runs one tool call under the deadline and wraps the outcome.
///
/// Emits exactly one structured log record per call, keyed by
/// subject/tool/outcome/correlation id.
async fn dispatch_tool(
    state: &McpServerState,
    subject: &Subject,
    name: &str,
    arguments: Value,
) -> CallToolResult {
    let correlation_id = CorrelationId::new();
    let started = Instant::now();

    let outcome = match state.registry.get(name) {
        None => Err(ToolError::validation(
            "name",
            format!("Unknown tool: {}", name),
        )),
        Some(spec) => {
            match tokio::time::timeout(
                state.call_deadline,
                run_tool(state, subject, spec.kind(), arguments),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ToolError::internal("Tool call timed out")
                    .with_detail("hint", "deadline exceeded")),
            }
        }
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(structured) => {
            tracing::info!(
                subject = %subject,
                tool = name,
                outcome = "success",
                correlation_id = %correlation_id,
                elapsed_ms,
                "tool call completed"
            );
            CallToolResult::success(structured)
        }
        Err(err) => {
            tracing::warn!(
                subject = %subject,
                tool = name,
                outcome = "error",
                error_type = %err.error_type,
                error_message = %err.message,
                retryable = err.is_retryable(),
                correlation_id = %correlation_id,
                elapsed_ms,
                "tool call failed"
            );
            CallToolResult::error(&err)
        }
    }
}

/// Validates, authorizes, and executes one tool invocation.
async fn run_tool(
    state: &McpServerState,
    subject: &Subject,
    kind: ToolKind,
    arguments: Value,
) -> Result<Value, ToolError> {
    match kind {
        ToolKind::AddTask => {
            let cmd = parse_arguments::<AddTaskParams>(arguments)?.into_command()?;
            ensure_subject_matches(subject, &cmd.user_id)?;
            to_structured(&state.tools.add.handle(cmd).await?)
        }
        ToolKind::ListTasks => {
            let query = parse_arguments::<ListTasksParams>(arguments)?.into_query()?;
            ensure_subject_matches(subject, &query.user_id)?;
            to_structured(&state.tools.list.handle(query).await?)
        }
        ToolKind::CompleteTask => {
            let cmd = parse_arguments::<CompleteTaskParams>(arguments)?.into_command()?;
            ensure_subject_matches(subject, &cmd.user_id)?;
            to_structured(&state.tools.complete.handle(cmd).await?)
        }
        ToolKind::UpdateTask => {
            let cmd = parse_arguments::<UpdateTaskParams>(arguments)?.into_command()?;
            ensure_subject_matches(subject, &cmd.user_id)?;
            to_structured(&state.tools.update.handle(cmd).await?)
        }
        ToolKind::DeleteTask => {
            let cmd = parse_arguments::<DeleteTaskParams>(arguments)?.into_command()?;
            ensure_subject_matches(subject, &cmd.user_id)?;
            to_structured(&state.tools.delete.handle(cmd).await?)
        }
    }
}

fn to_structured<T: serde::Serialize>(result: &T) -> Result<Value, ToolError> {
    serde_json::to_value(result).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize tool result");
        ToolError::internal("Internal error")
    })
}

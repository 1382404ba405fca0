//! Integration tests for the MCP tool surface.
//!
//! These tests drive the full axum router - credential gate, JSON-RPC
//! dispatch, parameter validation, authorization guard, and handlers -
//! against the in-memory repository, covering the end-to-end scenarios the
//! service guarantees.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use taskdeck::adapters::auth::MockTokenVerifier;
use taskdeck::adapters::mcp::{mcp_router, McpServerState};
use taskdeck::adapters::memory::InMemoryTaskRepository;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn app() -> axum::Router {
    let verifier = Arc::new(
        MockTokenVerifier::new()
            .with_subject("tok-u1", "u1")
            .with_subject("tok-u2", "u2"),
    );
    let repository = Arc::new(InMemoryTaskRepository::new());
    mcp_router(McpServerState::new(
        verifier,
        repository,
        Duration::from_secs(2),
    ))
}

async fn rpc(app: &axum::Router, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Calls a tool and returns the `CallToolResult` value.
async fn call_tool(app: &axum::Router, token: &str, name: &str, arguments: Value) -> Value {
    let (status, body) = rpc(
        app,
        Some(token),
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["result"].clone()
}

fn structured(result: &Value) -> &Value {
    &result["structuredContent"]
}

fn assert_error_type(result: &Value, expected: &str) {
    assert_eq!(result["isError"], true, "expected an error envelope: {result}");
    assert_eq!(structured(result)["error_type"], expected);
}

async fn count_for(app: &axum::Router, token: &str, user_id: &str, status: &str) -> u64 {
    let result = call_tool(
        app,
        token,
        "list_tasks",
        json!({ "user_id": user_id, "status": status }),
    )
    .await;
    assert_eq!(result["isError"], false);
    structured(&result)["count"].as_u64().unwrap()
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn missing_credential_is_rejected_with_unauthorized() {
    let app = app();
    let (status, body) = rpc(
        &app,
        None,
        json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_type"], "unauthorized");
}

#[tokio::test]
async fn invalid_credential_is_rejected_with_unauthorized() {
    let app = app();
    let (status, body) = rpc(
        &app,
        Some("forged-token"),
        json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_type"], "unauthorized");
}

#[tokio::test]
async fn subject_mismatch_is_unauthorized_not_not_found() {
    let app = app();
    let result = call_tool(
        &app,
        "tok-u1",
        "add_task",
        json!({ "user_id": "u2", "title": "Sneaky" }),
    )
    .await;

    assert_error_type(&result, "unauthorized");
}

// =============================================================================
// Discovery
// =============================================================================

#[tokio::test]
async fn tools_list_advertises_five_tools_with_schemas() {
    let app = app();
    let (status, body) = rpc(
        &app,
        Some("tok-u1"),
        json!({ "jsonrpc": "2.0", "id": 7, "method": "tools/list" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 7);
    let tools = body["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 5);

    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec!["add_task", "list_tasks", "complete_task", "update_task", "delete_task"]
    );
    for tool in tools {
        assert!(tool["inputSchema"].is_object());
        assert!(tool["outputSchema"].is_object());
    }
}

#[tokio::test]
async fn unknown_method_is_a_protocol_error() {
    let app = app();
    let (status, body) = rpc(
        &app,
        Some("tok-u1"),
        json!({ "jsonrpc": "2.0", "id": 1, "method": "tasks/purge" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32601);
}

#[tokio::test]
async fn unknown_tool_is_a_validation_error_not_a_protocol_error() {
    let app = app();
    let result = call_tool(&app, "tok-u1", "drop_database", json!({})).await;
    assert_error_type(&result, "validation");
}

// =============================================================================
// S1 - create & list
// =============================================================================

#[tokio::test]
async fn s1_create_and_list() {
    let app = app();

    let created = call_tool(
        &app,
        "tok-u1",
        "add_task",
        json!({ "user_id": "u1", "title": "Buy groceries", "description": "Milk, eggs" }),
    )
    .await;
    assert_eq!(created["isError"], false);
    let created = structured(&created);
    assert_eq!(created["status"], "created");
    assert_eq!(created["title"], "Buy groceries");
    assert_eq!(created["message"], "Task created successfully");
    let task_id = created["task_id"].as_str().unwrap().to_string();

    let listed = call_tool(
        &app,
        "tok-u1",
        "list_tasks",
        json!({ "user_id": "u1", "status": "all" }),
    )
    .await;
    let listed = structured(&listed);
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["status"], "success");

    let task = &listed["tasks"][0];
    assert_eq!(task["id"], task_id.as_str());
    assert_eq!(task["title"], "Buy groceries");
    assert_eq!(task["description"], "Milk, eggs");
    assert_eq!(task["completed"], false);
    assert_eq!(task["priority"], "none");
    assert_eq!(task["tags"], json!([]));
}

// =============================================================================
// S2 - toggle parity
// =============================================================================

#[tokio::test]
async fn s2_toggle_parity() {
    let app = app();

    let created = call_tool(
        &app,
        "tok-u1",
        "add_task",
        json!({ "user_id": "u1", "title": "Buy groceries" }),
    )
    .await;
    let task_id = structured(&created)["task_id"].as_str().unwrap().to_string();

    let first = call_tool(
        &app,
        "tok-u1",
        "complete_task",
        json!({ "user_id": "u1", "task_id": task_id }),
    )
    .await;
    assert_eq!(structured(&first)["status"], "completed");

    let second = call_tool(
        &app,
        "tok-u1",
        "complete_task",
        json!({ "user_id": "u1", "task_id": task_id }),
    )
    .await;
    assert_eq!(structured(&second)["status"], "uncompleted");

    assert_eq!(count_for(&app, "tok-u1", "u1", "pending").await, 1);
}

// =============================================================================
// S3 - cross-tenant hiding
// =============================================================================

#[tokio::test]
async fn s3_cross_tenant_access_reads_as_not_found() {
    let app = app();

    let created = call_tool(
        &app,
        "tok-u1",
        "add_task",
        json!({ "user_id": "u1", "title": "Private" }),
    )
    .await;
    let task_id = structured(&created)["task_id"].as_str().unwrap().to_string();

    // u2 probes u1's task with a perfectly valid credential of their own.
    let delete = call_tool(
        &app,
        "tok-u2",
        "delete_task",
        json!({ "user_id": "u2", "task_id": task_id }),
    )
    .await;
    assert_error_type(&delete, "not_found");

    let toggle = call_tool(
        &app,
        "tok-u2",
        "complete_task",
        json!({ "user_id": "u2", "task_id": task_id }),
    )
    .await;
    assert_error_type(&toggle, "not_found");

    // The task is untouched for its owner.
    assert_eq!(count_for(&app, "tok-u1", "u1", "all").await, 1);
}

// =============================================================================
// S4 - validation
// =============================================================================

#[tokio::test]
async fn s4_whitespace_title_is_rejected_without_side_effects() {
    let app = app();

    let result = call_tool(
        &app,
        "tok-u1",
        "add_task",
        json!({ "user_id": "u1", "title": "   " }),
    )
    .await;
    assert_error_type(&result, "validation");
    assert_eq!(structured(&result)["details"]["field"], "title");

    assert_eq!(count_for(&app, "tok-u1", "u1", "all").await, 0);
}

#[tokio::test]
async fn s4_update_with_no_fields_is_rejected() {
    let app = app();

    let created = call_tool(
        &app,
        "tok-u1",
        "add_task",
        json!({ "user_id": "u1", "title": "Report" }),
    )
    .await;
    let task_id = structured(&created)["task_id"].as_str().unwrap().to_string();

    let result = call_tool(
        &app,
        "tok-u1",
        "update_task",
        json!({ "user_id": "u1", "task_id": task_id }),
    )
    .await;
    assert_error_type(&result, "validation");
    assert!(structured(&result)["message"]
        .as_str()
        .unwrap()
        .contains("At least one field"));
}

// =============================================================================
// S5 - tag replacement semantics
// =============================================================================

#[tokio::test]
async fn s5_tag_replacement_semantics() {
    let app = app();

    let created = call_tool(
        &app,
        "tok-u1",
        "add_task",
        json!({ "user_id": "u1", "title": "Report", "tags": ["work", "urgent"] }),
    )
    .await;
    let task_id = structured(&created)["task_id"].as_str().unwrap().to_string();

    let listed = call_tool(&app, "tok-u1", "list_tasks", json!({ "user_id": "u1" })).await;
    assert_eq!(structured(&listed)["tasks"][0]["tags"], json!(["urgent", "work"]));

    // Present and empty clears all tags.
    call_tool(
        &app,
        "tok-u1",
        "update_task",
        json!({ "user_id": "u1", "task_id": task_id, "tags": [] }),
    )
    .await;
    let listed = call_tool(&app, "tok-u1", "list_tasks", json!({ "user_id": "u1" })).await;
    assert_eq!(structured(&listed)["tasks"][0]["tags"], json!([]));

    // Absent leaves tags alone while other fields change.
    call_tool(
        &app,
        "tok-u1",
        "update_task",
        json!({ "user_id": "u1", "task_id": task_id, "description": "draft" }),
    )
    .await;
    let listed = call_tool(&app, "tok-u1", "list_tasks", json!({ "user_id": "u1" })).await;
    assert_eq!(structured(&listed)["tasks"][0]["tags"], json!([]));
    assert_eq!(structured(&listed)["tasks"][0]["description"], "draft");
}

// =============================================================================
// S6 - filter & sort
// =============================================================================

#[tokio::test]
async fn s6_priority_filter_and_sort() {
    let app = app();

    for (title, priority) in [("A", "high"), ("B", "low"), ("C", "high")] {
        call_tool(
            &app,
            "tok-u1",
            "add_task",
            json!({ "user_id": "u1", "title": title, "priority": priority }),
        )
        .await;
        // Distinct creation instants for the tie-break.
        tokio::time::sleep(Duration::from_millis(3)).await;
    }

    let listed = call_tool(
        &app,
        "tok-u1",
        "list_tasks",
        json!({
            "user_id": "u1",
            "priority": "high",
            "sort": "priority",
            "order": "asc"
        }),
    )
    .await;

    let titles: Vec<&str> = structured(&listed)["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["C", "A"]);
}

#[tokio::test]
async fn tag_filter_and_no_tags_precedence() {
    let app = app();

    call_tool(
        &app,
        "tok-u1",
        "add_task",
        json!({ "user_id": "u1", "title": "Tagged", "tags": ["work"] }),
    )
    .await;
    call_tool(
        &app,
        "tok-u1",
        "add_task",
        json!({ "user_id": "u1", "title": "Bare" }),
    )
    .await;

    let tagged = call_tool(
        &app,
        "tok-u1",
        "list_tasks",
        json!({ "user_id": "u1", "tags": ["work", "missing"] }),
    )
    .await;
    assert_eq!(structured(&tagged)["count"], 1);
    assert_eq!(structured(&tagged)["tasks"][0]["title"], "Tagged");

    // no_tags wins when both are supplied.
    let bare = call_tool(
        &app,
        "tok-u1",
        "list_tasks",
        json!({ "user_id": "u1", "tags": ["work"], "no_tags": true }),
    )
    .await;
    assert_eq!(structured(&bare)["count"], 1);
    assert_eq!(structured(&bare)["tasks"][0]["title"], "Bare");
}

#[tokio::test]
async fn search_is_case_insensitive_substring() {
    let app = app();

    call_tool(
        &app,
        "tok-u1",
        "add_task",
        json!({ "user_id": "u1", "title": "Buy groceries", "description": "Milk, eggs" }),
    )
    .await;
    call_tool(
        &app,
        "tok-u1",
        "add_task",
        json!({ "user_id": "u1", "title": "Laundry" }),
    )
    .await;

    let by_title = call_tool(
        &app,
        "tok-u1",
        "list_tasks",
        json!({ "user_id": "u1", "search": "GROCER" }),
    )
    .await;
    assert_eq!(structured(&by_title)["count"], 1);

    let by_description = call_tool(
        &app,
        "tok-u1",
        "list_tasks",
        json!({ "user_id": "u1", "search": "milk" }),
    )
    .await;
    assert_eq!(structured(&by_description)["count"], 1);
}

// =============================================================================
// Error taxonomy closure
// =============================================================================

#[tokio::test]
async fn every_error_response_carries_a_known_error_type() {
    let app = app();
    let known = ["validation", "unauthorized", "not_found", "internal"];

    let failures = vec![
        call_tool(&app, "tok-u1", "nope", json!({})).await,
        call_tool(&app, "tok-u1", "add_task", json!({ "user_id": "u1", "title": " " })).await,
        call_tool(&app, "tok-u1", "add_task", json!({ "user_id": "u2", "title": "x" })).await,
        call_tool(
            &app,
            "tok-u1",
            "delete_task",
            json!({ "user_id": "u1", "task_id": "550e8400-e29b-41d4-a716-446655440000" }),
        )
        .await,
        call_tool(
            &app,
            "tok-u1",
            "complete_task",
            json!({ "user_id": "u1", "task_id": "not-a-uuid" }),
        )
        .await,
    ];

    for failure in failures {
        assert_eq!(failure["isError"], true);
        let error_type = structured(&failure)["error_type"].as_str().unwrap();
        assert!(known.contains(&error_type), "unexpected type {error_type}");
    }
}

// =============================================================================
// Cardinality conservation
// =============================================================================

#[tokio::test]
async fn add_and_delete_change_count_by_exactly_one() {
    let app = app();

    assert_eq!(count_for(&app, "tok-u1", "u1", "all").await, 0);

    let created = call_tool(
        &app,
        "tok-u1",
        "add_task",
        json!({ "user_id": "u1", "title": "One" }),
    )
    .await;
    let task_id = structured(&created)["task_id"].as_str().unwrap().to_string();
    assert_eq!(count_for(&app, "tok-u1", "u1", "all").await, 1);

    // Toggle and update preserve the count.
    call_tool(
        &app,
        "tok-u1",
        "complete_task",
        json!({ "user_id": "u1", "task_id": task_id }),
    )
    .await;
    call_tool(
        &app,
        "tok-u1",
        "update_task",
        json!({ "user_id": "u1", "task_id": task_id, "priority": "high" }),
    )
    .await;
    assert_eq!(count_for(&app, "tok-u1", "u1", "all").await, 1);

    let deleted = call_tool(
        &app,
        "tok-u1",
        "delete_task",
        json!({ "user_id": "u1", "task_id": task_id }),
    )
    .await;
    assert_eq!(structured(&deleted)["status"], "deleted");
    assert_eq!(structured(&deleted)["title"], "One");
    assert_eq!(count_for(&app, "tok-u1", "u1", "all").await, 0);
}

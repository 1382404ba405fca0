//! Tool registry - the declared set of task tools.
//!
//! Tools are a fixed registry of handler variants keyed by name, each with
//! its own input and output schema. The schemas are normative: `tools/list`
//! returns them verbatim, and the parameter layer enforces the same bounds.

use serde_json::Value;

/// Dispatch variant for a registered tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    AddTask,
    ListTasks,
    CompleteTask,
    UpdateTask,
    DeleteTask,
}

/// A named tool with its wire schemas.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    name: &'static str,
    description: &'static str,
    kind: ToolKind,
    input_schema: Value,
    output_schema: Value,
}

impl ToolSpec {
    /// Returns the tool name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the human description.
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Returns the dispatch variant.
    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    /// Returns the input schema.
    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Returns the output schema.
    pub fn output_schema(&self) -> &Value {
        &self.output_schema
    }
}

/// Registry of all task tools, in stable advertising order.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolSpec>,
}

impl ToolRegistry {
    /// Creates the standard five-tool registry.
    pub fn standard() -> Self {
        Self {
            tools: vec![
                add_task_tool(),
                list_tasks_tool(),
                complete_task_tool(),
                update_task_tool(),
                delete_task_tool(),
            ],
        }
    }

    /// Looks up a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true when no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Builds the `tools/list` result payload.
    pub fn list_payload(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema,
                    "outputSchema": t.output_schema,
                })
            })
            .collect();
        serde_json::json!({ "tools": tools })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Shared schema fragments
// ═══════════════════════════════════════════════════════════════════════════

fn user_id_property() -> Value {
    serde_json::json!({
        "type": "string",
        "minLength": 1,
        "description": "ID of the authenticated user; must match the credential subject"
    })
}

fn task_id_property() -> Value {
    serde_json::json!({
        "type": "string",
        "format": "uuid",
        "description": "ID of the target task"
    })
}

fn priority_property() -> Value {
    serde_json::json!({
        "type": "string",
        "enum": ["none", "low", "medium", "high"],
        "description": "Priority level"
    })
}

fn tags_property() -> Value {
    serde_json::json!({
        "type": "array",
        "items": { "type": "string", "minLength": 1, "maxLength": 50 },
        "maxItems": 20,
        "description": "Tag names; lowercase single words, deduplicated"
    })
}

fn command_output_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "required": ["task_id", "status", "title", "message"],
        "properties": {
            "task_id": { "type": "string", "format": "uuid" },
            "status": { "type": "string" },
            "title": { "type": "string" },
            "message": { "type": "string" }
        }
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Tool definitions
// ═══════════════════════════════════════════════════════════════════════════

fn add_task_tool() -> ToolSpec {
    ToolSpec {
        name: "add_task",
        description: "Create a new to-do task for the user. Title is required; \
                      description, priority, and tags are optional.",
        kind: ToolKind::AddTask,
        input_schema: serde_json::json!({
            "type": "object",
            "required": ["user_id", "title"],
            "properties": {
                "user_id": user_id_property(),
                "title": {
                    "type": "string",
                    "minLength": 1,
                    "maxLength": 200,
                    "description": "Short task title; must not be blank"
                },
                "description": {
                    "type": "string",
                    "maxLength": 2000,
                    "description": "Optional longer description"
                },
                "priority": priority_property(),
                "tags": tags_property()
            }
        }),
        output_schema: command_output_schema(),
    }
}

fn list_tasks_tool() -> ToolSpec {
    ToolSpec {
        name: "list_tasks",
        description: "List the user's tasks with optional filtering by status, \
                      priority, tags, and a text search, plus sorting.",
        kind: ToolKind::ListTasks,
        input_schema: serde_json::json!({
            "type": "object",
            "required": ["user_id"],
            "properties": {
                "user_id": user_id_property(),
                "status": {
                    "type": "string",
                    "enum": ["all", "pending", "completed"],
                    "description": "Completion filter; defaults to all"
                },
                "priority": {
                    "type": "string",
                    "enum": ["all", "high", "medium", "low", "none"],
                    "description": "Priority filter; defaults to all"
                },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Match tasks carrying any of these tags"
                },
                "no_tags": {
                    "type": "boolean",
                    "description": "Match only tasks with no tags; overrides the tags filter"
                },
                "search": {
                    "type": "string",
                    "description": "Case-insensitive substring match over title and description"
                },
                "sort": {
                    "type": "string",
                    "enum": ["priority", "title", "created_at"],
                    "description": "Sort field; defaults to created_at"
                },
                "order": {
                    "type": "string",
                    "enum": ["asc", "desc"],
                    "description": "Sort direction; for priority, asc means highest first"
                }
            }
        }),
        output_schema: serde_json::json!({
            "type": "object",
            "required": ["tasks", "count", "status"],
            "properties": {
                "tasks": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["id", "title", "completed", "priority", "tags",
                                     "created_at", "updated_at"],
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "title": { "type": "string" },
                            "description": { "type": ["string", "null"] },
                            "completed": { "type": "boolean" },
                            "priority": priority_property(),
                            "tags": { "type": "array", "items": { "type": "string" } },
                            "created_at": { "type": "string", "format": "date-time" },
                            "updated_at": { "type": "string", "format": "date-time" }
                        }
                    }
                },
                "count": { "type": "integer" },
                "status": { "type": "string" }
            }
        }),
    }
}

fn complete_task_tool() -> ToolSpec {
    ToolSpec {
        name: "complete_task",
        description: "Toggle a task's completion flag. Calling it on a completed \
                      task marks it pending again.",
        kind: ToolKind::CompleteTask,
        input_schema: serde_json::json!({
            "type": "object",
            "required": ["user_id", "task_id"],
            "properties": {
                "user_id": user_id_property(),
                "task_id": task_id_property()
            }
        }),
        output_schema: command_output_schema(),
    }
}

fn update_task_tool() -> ToolSpec {
    ToolSpec {
        name: "update_task",
        description: "Update a task's title, description, priority, or tags. At \
                      least one field is required; omitted fields are untouched; \
                      an empty tags list removes all tags.",
        kind: ToolKind::UpdateTask,
        input_schema: serde_json::json!({
            "type": "object",
            "required": ["user_id", "task_id"],
            "properties": {
                "user_id": user_id_property(),
                "task_id": task_id_property(),
                "title": {
                    "type": "string",
                    "minLength": 1,
                    "maxLength": 200,
                    "description": "New title"
                },
                "description": {
                    "type": "string",
                    "maxLength": 2000,
                    "description": "New description; empty clears it"
                },
                "priority": priority_property(),
                "tags": tags_property()
            }
        }),
        output_schema: command_output_schema(),
    }
}

fn delete_task_tool() -> ToolSpec {
    ToolSpec {
        name: "delete_task",
        description: "Permanently delete a task. There is no undo.",
        kind: ToolKind::DeleteTask,
        input_schema: serde_json::json!({
            "type": "object",
            "required": ["user_id", "task_id"],
            "properties": {
                "user_id": user_id_property(),
                "task_id": task_id_property()
            }
        }),
        output_schema: command_output_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_five_tools() {
        let registry = ToolRegistry::standard();
        assert_eq!(registry.len(), 5);
        for name in [
            "add_task",
            "list_tasks",
            "complete_task",
            "update_task",
            "delete_task",
        ] {
            assert!(registry.get(name).is_some(), "missing tool {}", name);
        }
    }

    #[test]
    fn unknown_tool_is_absent() {
        let registry = ToolRegistry::standard();
        assert!(registry.get("drop_database").is_none());
    }

    #[test]
    fn list_payload_advertises_schemas() {
        let registry = ToolRegistry::standard();
        let payload = registry.list_payload();
        let tools = payload["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 5);

        for tool in tools {
            assert!(tool["name"].is_string());
            assert!(tool["description"].is_string());
            assert_eq!(tool["inputSchema"]["type"], "object");
            assert_eq!(tool["outputSchema"]["type"], "object");
        }
    }

    #[test]
    fn every_input_schema_requires_user_id() {
        let registry = ToolRegistry::standard();
        let payload = registry.list_payload();
        for tool in payload["tools"].as_array().unwrap() {
            let required = tool["inputSchema"]["required"].as_array().unwrap();
            assert!(
                required.iter().any(|v| v == "user_id"),
                "{} must require user_id",
                tool["name"]
            );
        }
    }

    #[test]
    fn update_schema_documents_closed_priority_enum() {
        let registry = ToolRegistry::standard();
        let spec = registry.get("update_task").unwrap();
        let levels = &spec.input_schema()["properties"]["priority"]["enum"];
        assert_eq!(levels.as_array().unwrap().len(), 4);
    }
}

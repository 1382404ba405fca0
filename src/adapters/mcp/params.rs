//! Tool parameter DTOs and declarative validation.
//!
//! Rules applied uniformly, before any state is touched:
//! - strings are trimmed before length checks; empty-after-trim fails
//! - enumerations are closed; unknown values are `validation` errors
//! - UUID identifiers must parse
//! - `update_task` requires at least one updatable field

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::application::handlers::task::{
    AddTaskCommand, CompleteTaskCommand, DeleteTaskCommand, ListTasksQuery, UpdateTaskCommand,
};
use crate::domain::foundation::{TaskId, ToolError, UserId};
use crate::domain::task::{
    normalize_set, Priority, PriorityFilter, SortField, SortOrder, StatusFilter, TaskFilter,
    TaskPatch, TaskSort, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH,
};

/// Deserializes a tool's `arguments` object into a typed DTO.
pub fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::validation("arguments", format!("Invalid arguments: {}", e)))
}

// ═══════════════════════════════════════════════════════════════════════════
// Field parsers
// ═══════════════════════════════════════════════════════════════════════════

fn parse_user_id(raw: &str) -> Result<UserId, ToolError> {
    UserId::new(raw)
}

fn parse_task_id(raw: &str) -> Result<TaskId, ToolError> {
    raw.trim()
        .parse::<TaskId>()
        .map_err(|_| ToolError::validation("task_id", "task_id must be a valid UUID"))
}

fn parse_title(raw: &str) -> Result<String, ToolError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ToolError::validation("title", "Title cannot be empty"));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(ToolError::validation(
            "title",
            format!("Title must be {} characters or less", MAX_TITLE_LENGTH),
        ));
    }
    Ok(trimmed.to_string())
}

fn parse_description(raw: &str) -> Result<Option<String>, ToolError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ToolError::validation(
            "description",
            format!(
                "Description must be {} characters or less",
                MAX_DESCRIPTION_LENGTH
            ),
        ));
    }
    Ok(Some(trimmed.to_string()))
}

fn parse_priority(raw: &str) -> Result<Priority, ToolError> {
    Priority::parse(raw.trim()).ok_or_else(|| {
        ToolError::validation(
            "priority",
            "priority must be one of: none, low, medium, high",
        )
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// add_task
// ═══════════════════════════════════════════════════════════════════════════

/// Wire parameters for `add_task`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddTaskParams {
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl AddTaskParams {
    /// Validates into a command.
    pub fn into_command(self) -> Result<AddTaskCommand, ToolError> {
        Ok(AddTaskCommand {
            user_id: parse_user_id(&self.user_id)?,
            title: parse_title(&self.title)?,
            description: match self.description {
                Some(raw) => parse_description(&raw)?,
                None => None,
            },
            priority: match self.priority {
                Some(raw) => parse_priority(&raw)?,
                None => Priority::default(),
            },
            tags: match self.tags {
                Some(raw) => normalize_set(&raw)?,
                None => Vec::new(),
            },
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// list_tasks
// ═══════════════════════════════════════════════════════════════════════════

/// Wire parameters for `list_tasks`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListTasksParams {
    pub user_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub no_tags: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
}

impl ListTasksParams {
    /// Validates into a query.
    pub fn into_query(self) -> Result<ListTasksQuery, ToolError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => StatusFilter::default(),
            Some(raw) => StatusFilter::parse(raw).ok_or_else(|| {
                ToolError::validation("status", "status must be one of: all, pending, completed")
            })?,
        };

        let priority = match self.priority.as_deref().map(str::trim) {
            None | Some("") => PriorityFilter::default(),
            Some(raw) => PriorityFilter::parse(raw).ok_or_else(|| {
                ToolError::validation(
                    "priority",
                    "priority must be one of: all, high, medium, low, none",
                )
            })?,
        };

        let tags = match self.tags {
            Some(raw) => normalize_set(&raw)?,
            None => Vec::new(),
        };

        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let field = match self.sort.as_deref().map(str::trim) {
            None | Some("") => SortField::default(),
            Some(raw) => SortField::parse(raw).ok_or_else(|| {
                ToolError::validation("sort", "sort must be one of: priority, title, created_at")
            })?,
        };

        let order = match self.order.as_deref().map(str::trim) {
            None | Some("") => SortOrder::default(),
            Some(raw) => SortOrder::parse(raw).ok_or_else(|| {
                ToolError::validation("order", "order must be one of: asc, desc")
            })?,
        };

        Ok(ListTasksQuery {
            user_id: parse_user_id(&self.user_id)?,
            filter: TaskFilter {
                status,
                priority,
                tags,
                no_tags: self.no_tags.unwrap_or(false),
                search,
            },
            sort: TaskSort { field, order },
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// complete_task / delete_task
// ═══════════════════════════════════════════════════════════════════════════

/// Wire parameters for `complete_task`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteTaskParams {
    pub user_id: String,
    pub task_id: String,
}

impl CompleteTaskParams {
    /// Validates into a command.
    pub fn into_command(self) -> Result<CompleteTaskCommand, ToolError> {
        Ok(CompleteTaskCommand {
            user_id: parse_user_id(&self.user_id)?,
            task_id: parse_task_id(&self.task_id)?,
        })
    }
}

/// Wire parameters for `delete_task`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteTaskParams {
    pub user_id: String,
    pub task_id: String,
}

impl DeleteTaskParams {
    /// Validates into a command.
    pub fn into_command(self) -> Result<DeleteTaskCommand, ToolError> {
        Ok(DeleteTaskCommand {
            user_id: parse_user_id(&self.user_id)?,
            task_id: parse_task_id(&self.task_id)?,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// update_task
// ═══════════════════════════════════════════════════════════════════════════

/// Wire parameters for `update_task`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTaskParams {
    pub user_id: String,
    pub task_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl UpdateTaskParams {
    /// Validates into a command, enforcing the at-least-one-field rule.
    pub fn into_command(self) -> Result<UpdateTaskCommand, ToolError> {
        if self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
        {
            return Err(ToolError::validation(
                "fields",
                "At least one field is required: title, description, priority, or tags",
            ));
        }

        let patch = TaskPatch {
            title: match self.title {
                Some(raw) => Some(parse_title(&raw)?),
                None => None,
            },
            // Present but empty clears the description.
            description: match self.description {
                Some(raw) => Some(parse_description(&raw)?),
                None => None,
            },
            priority: match self.priority {
                Some(raw) => Some(parse_priority(&raw)?),
                None => None,
            },
            // Present but empty clears all tags; absent leaves them alone.
            tags: match self.tags {
                Some(raw) => Some(normalize_set(&raw)?),
                None => None,
            },
        };

        Ok(UpdateTaskCommand {
            user_id: parse_user_id(&self.user_id)?,
            task_id: parse_task_id(&self.task_id)?,
            patch,
        })
    }
}

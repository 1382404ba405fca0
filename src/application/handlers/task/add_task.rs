//! AddTaskHandler - creates a task for the authenticated user.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{TaskId, ToolError, UserId};
use crate::domain::task::{Priority, TagName};
use crate::ports::{CreateTask, TaskRepository};

/// Command to create a new task.
#[derive(Debug, Clone)]
pub struct AddTaskCommand {
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub tags: Vec<TagName>,
}

/// Result of successful task creation.
#[derive(Debug, Clone, Serialize)]
pub struct AddTaskResult {
    pub task_id: TaskId,
    pub status: &'static str,
    pub title: String,
    pub message: String,
}

/// Handler for `add_task`.
pub struct AddTaskHandler {
    repository: Arc<dyn TaskRepository>,
}

impl AddTaskHandler {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: AddTaskCommand) -> Result<AddTaskResult, ToolError> {
        let task = self
            .repository
            .create(
                &cmd.user_id,
                CreateTask {
                    title: cmd.title,
                    description: cmd.description,
                    priority: cmd.priority,
                    tags: cmd.tags,
                },
            )
            .await?;

        Ok(AddTaskResult {
            task_id: task.id(),
            status: "created",
            title: task.title().to_string(),
            message: "Task created successfully".to_string(),
        })
    }
}

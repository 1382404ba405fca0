//! DeleteTaskHandler - hard delete.
//!
//! The title is captured before deletion so the response can echo it. Tag
//! associations go with the task; tag rows themselves remain.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{TaskId, ToolError, UserId};
use crate::ports::TaskRepository;

/// Command to delete a task.
#[derive(Debug, Clone)]
pub struct DeleteTaskCommand {
    pub user_id: UserId,
    pub task_id: TaskId,
}

/// Result of a successful deletion.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteTaskResult {
    pub task_id: TaskId,
    pub status: &'static str,
    pub title: String,
    pub message: String,
}

/// Handler for `delete_task`.
pub struct DeleteTaskHandler {
    repository: Arc<dyn TaskRepository>,
}

impl DeleteTaskHandler {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: DeleteTaskCommand) -> Result<DeleteTaskResult, ToolError> {
        let task = self
            .repository
            .get(&cmd.user_id, cmd.task_id)
            .await?
            .ok_or_else(|| ToolError::not_found("Task not found"))?;

        let deleted = self.repository.delete(&cmd.user_id, cmd.task_id).await?;
        if !deleted {
            // Lost a race with a concurrent delete.
            return Err(ToolError::not_found("Task not found"));
        }

        Ok(DeleteTaskResult {
            task_id: cmd.task_id,
            status: "deleted",
            title: task.title().to_string(),
            message: "Task deleted successfully".to_string(),
        })
    }
}

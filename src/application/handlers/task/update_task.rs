//! UpdateTaskHandler - field-wise task patching.
//!
//! Fields absent from the patch are untouched; a present, empty tag list
//! clears all tags. The "at least one field" rule is enforced by the
//! parameter validator before this handler runs.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{TaskId, ToolError, UserId};
use crate::domain::task::TaskPatch;
use crate::ports::TaskRepository;

/// Command to patch an existing task.
#[derive(Debug, Clone)]
pub struct UpdateTaskCommand {
    pub user_id: UserId,
    pub task_id: TaskId,
    pub patch: TaskPatch,
}

/// Result of a successful update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateTaskResult {
    pub task_id: TaskId,
    pub status: &'static str,
    pub title: String,
    pub message: String,
}

/// Handler for `update_task`.
pub struct UpdateTaskHandler {
    repository: Arc<dyn TaskRepository>,
}

impl UpdateTaskHandler {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: UpdateTaskCommand) -> Result<UpdateTaskResult, ToolError> {
        let task = self
            .repository
            .update(&cmd.user_id, cmd.task_id, cmd.patch)
            .await?
            .ok_or_else(|| ToolError::not_found("Task not found"))?;

        Ok(UpdateTaskResult {
            task_id: task.id(),
            status: "updated",
            title: task.title().to_string(),
            message: "Task updated successfully".to_string(),
        })
    }
}

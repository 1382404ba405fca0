//! CompleteTaskHandler - atomic completion toggle.
//!
//! This tool is a toggle, not a set: repeated calls flip the state back and
//! forth. Two consecutive successful calls restore the original value.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{TaskId, ToolError, UserId};
use crate::ports::TaskRepository;

/// Command to toggle a task's completion flag.
#[derive(Debug, Clone)]
pub struct CompleteTaskCommand {
    pub user_id: UserId,
    pub task_id: TaskId,
}

/// Result of a successful toggle.
#[derive(Debug, Clone, Serialize)]
pub struct CompleteTaskResult {
    pub task_id: TaskId,
    pub status: &'static str,
    pub title: String,
    pub message: String,
}

/// Handler for `complete_task`.
pub struct CompleteTaskHandler {
    repository: Arc<dyn TaskRepository>,
}

impl CompleteTaskHandler {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: CompleteTaskCommand) -> Result<CompleteTaskResult, ToolError> {
        let outcome = self
            .repository
            .toggle_completed(&cmd.user_id, cmd.task_id)
            .await?
            .ok_or_else(|| ToolError::not_found("Task not found"))?;

        let status = if outcome.completed { "completed" } else { "uncompleted" };

        Ok(CompleteTaskResult {
            task_id: outcome.task_id,
            status,
            title: outcome.title.clone(),
            message: format!("Task marked as {}", status),
        })
    }
}

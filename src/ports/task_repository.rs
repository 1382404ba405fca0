//! Task repository port.
//!
//! The only contract through which persistent task state is touched. Every
//! operation is scoped by the owning user: a task owned by someone else is
//! indistinguishable from an absent one at this interface.
//!
//! # Design
//!
//! - **Tenant-scoped**: `owner` is a mandatory argument on every operation
//! - **Transactional**: each operation runs inside a single transaction
//! - **Retrying**: implementations retry serialization-class failures at
//!   most twice with short backoff before surfacing `internal`

use async_trait::async_trait;

use crate::domain::foundation::{TaskId, ToolError, UserId};
use crate::domain::task::{Priority, TagName, Task, TaskFilter, TaskPatch, TaskSort};

/// Validated fields for task creation.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub tags: Vec<TagName>,
}

/// Result of an atomic completion toggle.
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub task_id: TaskId,
    pub completed: bool,
    pub title: String,
}

/// Repository port for Task aggregate persistence.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts a task, binds its tags, assigns id and timestamps.
    ///
    /// # Errors
    ///
    /// - `validation` when a field invariant is violated
    /// - `internal` on persistence failure after retries
    async fn create(&self, owner: &UserId, fields: CreateTask) -> Result<Task, ToolError>;

    /// Returns the task iff it exists and belongs to `owner`.
    async fn get(&self, owner: &UserId, id: TaskId) -> Result<Option<Task>, ToolError>;

    /// Scoped, filtered, sorted listing of the owner's tasks.
    async fn list(
        &self,
        owner: &UserId,
        filter: &TaskFilter,
        sort: &TaskSort,
    ) -> Result<Vec<Task>, ToolError>;

    /// Applies a patch under a row lock, rebinding tags when present.
    ///
    /// Returns `None` when the task is absent or foreign-owned.
    async fn update(
        &self,
        owner: &UserId,
        id: TaskId,
        patch: TaskPatch,
    ) -> Result<Option<Task>, ToolError>;

    /// Atomically flips the completion flag.
    ///
    /// Returns `None` when the task is absent or foreign-owned.
    async fn toggle_completed(
        &self,
        owner: &UserId,
        id: TaskId,
    ) -> Result<Option<ToggleOutcome>, ToolError>;

    /// Hard-deletes the task and its tag associations (tag rows remain).
    ///
    /// Returns `false` when the task is absent or foreign-owned.
    async fn delete(&self, owner: &UserId, id: TaskId) -> Result<bool, ToolError>;
}

//! In-memory implementation of TaskRepository.
//!
//! Backs unit and integration tests. Shares the filter and sort semantics
//! with the PostgreSQL adapter through the domain types, so listings agree
//! across both. A single mutex serializes all operations, which trivially
//! satisfies the transactional contract of the port.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{TaskId, ToolError, UserId};
use crate::domain::task::{Task, TaskFilter, TaskPatch, TaskSort};
use crate::ports::{CreateTask, TaskRepository, ToggleOutcome};

/// In-memory task store keyed by task id.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored tasks across all owners (test helper).
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Returns true when no tasks are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, owner: &UserId, fields: CreateTask) -> Result<Task, ToolError> {
        let task = Task::new(
            TaskId::new(),
            owner.clone(),
            fields.title,
            fields.description,
            fields.priority,
            fields.tags,
        )?;

        self.tasks.lock().unwrap().insert(task.id(), task.clone());
        Ok(task)
    }

    async fn get(&self, owner: &UserId, id: TaskId) -> Result<Option<Task>, ToolError> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .get(&id)
            .filter(|t| t.is_owned_by(owner))
            .cloned())
    }

    async fn list(
        &self,
        owner: &UserId,
        filter: &TaskFilter,
        sort: &TaskSort,
    ) -> Result<Vec<Task>, ToolError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.is_owned_by(owner) && filter.matches(t))
            .cloned()
            .collect();

        tasks.sort_by(|a, b| sort.compare(a, b));
        Ok(tasks)
    }

    async fn update(
        &self,
        owner: &UserId,
        id: TaskId,
        patch: TaskPatch,
    ) -> Result<Option<Task>, ToolError> {
        let mut tasks = self.tasks.lock().unwrap();
        let Some(task) = tasks.get_mut(&id).filter(|t| t.is_owned_by(owner)) else {
            return Ok(None);
        };

        task.apply(patch)?;
        Ok(Some(task.clone()))
    }

    async fn toggle_completed(
        &self,
        owner: &UserId,
        id: TaskId,
    ) -> Result<Option<ToggleOutcome>, ToolError> {
        let mut tasks = self.tasks.lock().unwrap();
        let Some(task) = tasks.get_mut(&id).filter(|t| t.is_owned_by(owner)) else {
            return Ok(None);
        };

        let completed = task.toggle_completed();
        Ok(Some(ToggleOutcome {
            task_id: id,
            completed,
            title: task.title().to_string(),
        }))
    }

    async fn delete(&self, owner: &UserId, id: TaskId) -> Result<bool, ToolError> {
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.get(&id) {
            Some(task) if task.is_owned_by(owner) => {
                tasks.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

//! Task tool handlers - one thin orchestrator per tool.

mod add_task;
mod complete_task;
mod delete_task;
mod list_tasks;
mod update_task;

pub use add_task::{AddTaskCommand, AddTaskHandler, AddTaskResult};
pub use complete_task::{CompleteTaskCommand, CompleteTaskHandler, CompleteTaskResult};
pub use delete_task::{DeleteTaskCommand, DeleteTaskHandler, DeleteTaskResult};
pub use list_tasks::{ListTasksHandler, ListTasksQuery, ListTasksResult, TaskItem};
pub use update_task::{UpdateTaskCommand, UpdateTaskHandler, UpdateTaskResult};

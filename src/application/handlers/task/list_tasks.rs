//! ListTasksHandler - scoped, filtered, sorted listing.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{TaskId, ToolError, UserId};
use crate::domain::task::{Priority, Task, TaskFilter, TaskSort};
use crate::ports::TaskRepository;

/// Query for listing the authenticated user's tasks.
#[derive(Debug, Clone)]
pub struct ListTasksQuery {
    pub user_id: UserId,
    pub filter: TaskFilter,
    pub sort: TaskSort,
}

/// Wire projection of a task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskItem {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Task> for TaskItem {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_string(),
            description: task.description().map(str::to_string),
            completed: task.completed(),
            priority: task.priority(),
            tags: task.tags().iter().map(|t| t.as_str().to_string()).collect(),
            created_at: task.created_at().to_rfc3339(),
            updated_at: task.updated_at().to_rfc3339(),
        }
    }
}

/// Result of a successful listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListTasksResult {
    pub tasks: Vec<TaskItem>,
    pub count: usize,
    pub status: &'static str,
}

/// Handler for `list_tasks`.
pub struct ListTasksHandler {
    repository: Arc<dyn TaskRepository>,
}

impl ListTasksHandler {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: ListTasksQuery) -> Result<ListTasksResult, ToolError> {
        let tasks = self
            .repository
            .list(&query.user_id, &query.filter, &query.sort)
            .await?;

        let items: Vec<TaskItem> = tasks.iter().map(TaskItem::from).collect();
        let count = items.len();

        Ok(ListTasksResult {
            tasks: items,
            count,
            status: "success",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryTaskRepository;
    use crate::domain::task::{
        normalize_set, PriorityFilter, SortField, SortOrder, StatusFilter,
    };
    use crate::ports::CreateTask;

    fn owner() -> UserId {
        UserId::new("u1").unwrap()
    }

    async fn seed(repo: &InMemoryTaskRepository, title: &str, priority: Priority, tags: &[&str]) {
        let raw: Vec<String> = tags.iter().map(|s| s.to_string()).collect();
        repo.create(
            &owner(),
            CreateTask {
                title: title.to_string(),
                description: None,
                priority,
                tags: normalize_set(&raw).unwrap(),
            },
        )
        .await
        .unwrap();
        // Keep created_at strictly increasing between seeds.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    #[tokio::test]
    async fn lists_only_the_owners_tasks() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        seed(&repo, "Mine", Priority::None, &[]).await;
        repo.create(
            &UserId::new("u2").unwrap(),
            CreateTask {
                title: "Theirs".to_string(),
                description: None,
                priority: Priority::None,
                tags: Vec::new(),
            },
        )
        .await
        .unwrap();

        let handler = ListTasksHandler::new(repo);
        let result = handler
            .handle(ListTasksQuery {
                user_id: owner(),
                filter: TaskFilter::default(),
                sort: TaskSort::default(),
            })
            .await
            .unwrap();

        assert_eq!(result.count, 1);
        assert_eq!(result.tasks[0].title, "Mine");
        assert_eq!(result.status, "success");
    }

    #[tokio::test]
    async fn filters_by_status() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        seed(&repo, "Open", Priority::None, &[]).await;
        seed(&repo, "Done", Priority::None, &[]).await;

        let all = repo
            .list(&owner(), &TaskFilter::default(), &TaskSort::default())
            .await
            .unwrap();
        let done_id = all.iter().find(|t| t.title() == "Done").unwrap().id();
        repo.toggle_completed(&owner(), done_id).await.unwrap();

        let handler = ListTasksHandler::new(repo);
        let result = handler
            .handle(ListTasksQuery {
                user_id: owner(),
                filter: TaskFilter {
                    status: StatusFilter::Pending,
                    ..Default::default()
                },
                sort: TaskSort::default(),
            })
            .await
            .unwrap();

        assert_eq!(result.count, 1);
        assert_eq!(result.tasks[0].title, "Open");
    }

    #[tokio::test]
    async fn priority_asc_returns_highest_first_with_created_desc_ties() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        seed(&repo, "A", Priority::High, &[]).await;
        seed(&repo, "B", Priority::Low, &[]).await;
        seed(&repo, "C", Priority::High, &[]).await;

        let handler = ListTasksHandler::new(repo);
        let result = handler
            .handle(ListTasksQuery {
                user_id: owner(),
                filter: TaskFilter {
                    priority: PriorityFilter::Exact(Priority::High),
                    ..Default::default()
                },
                sort: TaskSort {
                    field: SortField::Priority,
                    order: SortOrder::Asc,
                },
            })
            .await
            .unwrap();

        let titles: Vec<&str> = result.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A"]);
    }

    #[tokio::test]
    async fn task_item_carries_full_projection() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        seed(&repo, "Report", Priority::Medium, &["work"]).await;

        let handler = ListTasksHandler::new(repo);
        let result = handler
            .handle(ListTasksQuery {
                user_id: owner(),
                filter: TaskFilter::default(),
                sort: TaskSort::default(),
            })
            .await
            .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        let item = &json["tasks"][0];
        assert_eq!(item["title"], "Report");
        assert_eq!(item["completed"], false);
        assert_eq!(item["priority"], "medium");
        assert_eq!(item["tags"][0], "work");
        assert!(item["created_at"].is_string());
        assert!(item["updated_at"].is_string());
    }
}

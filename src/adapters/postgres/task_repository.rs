//! PostgreSQL implementation of TaskRepository.
//!
//! Every operation runs inside a single transaction, scoped by owner in the
//! WHERE clause so a foreign task is indistinguishable from an absent one.
//! Every mutation waits for the target row lock under a 1 s `lock_timeout`:
//! patches read with `SELECT ... FOR UPDATE` before writing, while toggles
//! and deletes take the lock through their single UPDATE/DELETE statement.
//! Serialization-class failures (40001, 40P01, 55P03) are retried at most
//! twice with short backoff; anything else surfaces as `internal` with the
//! cause confined to the logs.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use uuid::Uuid;

use crate::domain::foundation::{TagId, TaskId, Timestamp, ToolError, UserId};
use crate::domain::task::{
    Priority, PriorityFilter, SortField, SortOrder, StatusFilter, TagName, Task, TaskFilter,
    TaskPatch, TaskSort,
};
use crate::ports::{CreateTask, TaskRepository, ToggleOutcome};

/// Retries after the initial attempt for serialization-class failures.
const MAX_RETRIES: u32 = 2;

/// Base backoff between retries; grows linearly per attempt.
const RETRY_BACKOFF_MS: u64 = 25;

/// Columns selected for a full task projection, tags included.
const TASK_COLUMNS: &str = "t.id, t.owner_id, t.title, t.description, t.completed, t.priority, \
     t.created_at, t.updated_at, \
     COALESCE((SELECT array_agg(g.name ORDER BY g.name) \
               FROM task_tags tt JOIN tags g ON g.id = tt.tag_id \
               WHERE tt.task_id = t.id), '{}') AS tags";

/// Internal error split: domain failures pass through, database failures
/// feed the retry decision before collapsing to `internal`.
enum RepoError {
    Db(sqlx::Error),
    Domain(ToolError),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        RepoError::Db(e)
    }
}

/// PostgreSQL implementation of TaskRepository.
#[derive(Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new PostgresTaskRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn try_create(&self, owner: &UserId, fields: &CreateTask) -> Result<Task, RepoError> {
        let task = Task::new(
            TaskId::new(),
            owner.clone(),
            fields.title.clone(),
            fields.description.clone(),
            fields.priority,
            fields.tags.clone(),
        )
        .map_err(RepoError::Domain)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, owner_id, title, description, completed, priority, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(task.id().as_uuid())
        .bind(task.owner_id().as_str())
        .bind(task.title())
        .bind(task.description())
        .bind(task.completed())
        .bind(task.priority().as_str())
        .bind(task.created_at().as_datetime())
        .bind(task.updated_at().as_datetime())
        .execute(&mut *tx)
        .await?;

        bind_tags(&mut tx, owner, task.id(), task.tags()).await?;

        tx.commit().await?;
        Ok(task)
    }

    async fn try_get(&self, owner: &UserId, id: TaskId) -> Result<Option<Task>, RepoError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tasks t WHERE t.id = $1 AND t.owner_id = $2",
            TASK_COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_task(&r)).transpose()
    }

    async fn try_list(
        &self,
        owner: &UserId,
        filter: &TaskFilter,
        sort: &TaskSort,
    ) -> Result<Vec<Task>, RepoError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM tasks t WHERE t.owner_id = ",
            TASK_COLUMNS
        ));
        qb.push_bind(owner.as_str().to_string());

        match filter.status {
            StatusFilter::All => {}
            StatusFilter::Pending => {
                qb.push(" AND t.completed = FALSE");
            }
            StatusFilter::Completed => {
                qb.push(" AND t.completed = TRUE");
            }
        }

        if let PriorityFilter::Exact(priority) = filter.priority {
            qb.push(" AND t.priority = ");
            qb.push_bind(priority.as_str());
        }

        if filter.no_tags {
            qb.push(" AND NOT EXISTS (SELECT 1 FROM task_tags tt WHERE tt.task_id = t.id)");
        } else if !filter.tags.is_empty() {
            let names: Vec<String> =
                filter.tags.iter().map(|t| t.as_str().to_string()).collect();
            qb.push(
                " AND EXISTS (SELECT 1 FROM task_tags tt JOIN tags g ON g.id = tt.tag_id \
                 WHERE tt.task_id = t.id AND g.name = ANY(",
            );
            qb.push_bind(names);
            qb.push("))");
        }

        if let Some(query) = &filter.search {
            let pattern = format!("%{}%", escape_like(query));
            qb.push(" AND (t.title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR COALESCE(t.description, '') ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        qb.push(" ");
        qb.push(order_by_clause(sort));

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_task).collect()
    }

    async fn try_update(
        &self,
        owner: &UserId,
        id: TaskId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, RepoError> {
        let mut tx = self.pool.begin().await?;

        // Bound the wait for a concurrently-held row lock.
        sqlx::query("SET LOCAL lock_timeout = '1s'")
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM tasks t WHERE t.id = $1 AND t.owner_id = $2 FOR UPDATE",
            TASK_COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(owner.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut task = row_to_task(&row)?;
        let rebind = patch.tags.is_some();
        task.apply(patch.clone()).map_err(RepoError::Domain)?;

        sqlx::query(
            r#"
            UPDATE tasks SET
                title = $3,
                description = $4,
                priority = $5,
                updated_at = $6
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(owner.as_str())
        .bind(task.title())
        .bind(task.description())
        .bind(task.priority().as_str())
        .bind(task.updated_at().as_datetime())
        .execute(&mut *tx)
        .await?;

        if rebind {
            bind_tags(&mut tx, owner, id, task.tags()).await?;
        }

        tx.commit().await?;
        Ok(Some(task))
    }

    async fn try_toggle(
        &self,
        owner: &UserId,
        id: TaskId,
    ) -> Result<Option<ToggleOutcome>, RepoError> {
        let mut tx = self.pool.begin().await?;

        // Bound the wait for a concurrently-held row lock.
        sqlx::query("SET LOCAL lock_timeout = '1s'")
            .execute(&mut *tx)
            .await?;

        // The conditional UPDATE takes the row lock itself; concurrent
        // toggles on the same task serialize in lock-arrival order.
        let row = sqlx::query(
            r#"
            UPDATE tasks SET
                completed = NOT completed,
                updated_at = $3
            WHERE id = $1 AND owner_id = $2
            RETURNING completed, title
            "#,
        )
        .bind(id.as_uuid())
        .bind(owner.as_str())
        .bind(Timestamp::now().as_datetime())
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.map(|r| ToggleOutcome {
            task_id: id,
            completed: r.get("completed"),
            title: r.get("title"),
        }))
    }

    async fn try_delete(&self, owner: &UserId, id: TaskId) -> Result<bool, RepoError> {
        let mut tx = self.pool.begin().await?;

        // Bound the wait for a concurrently-held row lock.
        sqlx::query("SET LOCAL lock_timeout = '1s'")
            .execute(&mut *tx)
            .await?;

        // ON DELETE CASCADE removes the associations; tag rows remain.
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id.as_uuid())
            .bind(owner.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create(&self, owner: &UserId, fields: CreateTask) -> Result<Task, ToolError> {
        retry("create task", || self.try_create(owner, &fields)).await
    }

    async fn get(&self, owner: &UserId, id: TaskId) -> Result<Option<Task>, ToolError> {
        retry("get task", || self.try_get(owner, id)).await
    }

    async fn list(
        &self,
        owner: &UserId,
        filter: &TaskFilter,
        sort: &TaskSort,
    ) -> Result<Vec<Task>, ToolError> {
        retry("list tasks", || self.try_list(owner, filter, sort)).await
    }

    async fn update(
        &self,
        owner: &UserId,
        id: TaskId,
        patch: TaskPatch,
    ) -> Result<Option<Task>, ToolError> {
        retry("update task", || self.try_update(owner, id, &patch)).await
    }

    async fn toggle_completed(
        &self,
        owner: &UserId,
        id: TaskId,
    ) -> Result<Option<ToggleOutcome>, ToolError> {
        retry("toggle task", || self.try_toggle(owner, id)).await
    }

    async fn delete(&self, owner: &UserId, id: TaskId) -> Result<bool, ToolError> {
        retry("delete task", || self.try_delete(owner, id)).await
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

/// Runs an operation, retrying serialization-class failures at most
/// [`MAX_RETRIES`] times with linear backoff.
async fn retry<T, F, Fut>(operation: &str, mut f: F) -> Result<T, ToolError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, RepoError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(RepoError::Domain(err)) => return Err(err),
            Err(RepoError::Db(err)) => {
                if attempt < MAX_RETRIES && is_serialization_failure(&err) {
                    attempt += 1;
                    tracing::warn!(
                        operation,
                        attempt,
                        error = %err,
                        "Retrying after serialization failure"
                    );
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64))
                        .await;
                    continue;
                }
                tracing::error!(operation, error = %err, "Storage operation failed");
                return Err(ToolError::internal("Storage operation failed"));
            }
        }
    }
}

/// Serialization failure (40001), deadlock (40P01), lock timeout (55P03).
fn is_serialization_failure(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => match db.code() {
            Some(code) => is_serialization_code(&code),
            None => false,
        },
        _ => false,
    }
}

fn is_serialization_code(code: &str) -> bool {
    matches!(code, "40001" | "40P01" | "55P03")
}

/// Escapes LIKE metacharacters so user input matches literally.
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// ORDER BY fragment for a sort spec. For `priority`, `asc` means
/// highest-first; priority and title ties break by newest creation.
fn order_by_clause(sort: &TaskSort) -> &'static str {
    match (sort.field, sort.order) {
        (SortField::Priority, SortOrder::Asc) => {
            "ORDER BY CASE t.priority WHEN 'high' THEN 3 WHEN 'medium' THEN 2 \
             WHEN 'low' THEN 1 ELSE 0 END DESC, t.created_at DESC"
        }
        (SortField::Priority, SortOrder::Desc) => {
            "ORDER BY CASE t.priority WHEN 'high' THEN 3 WHEN 'medium' THEN 2 \
             WHEN 'low' THEN 1 ELSE 0 END ASC, t.created_at DESC"
        }
        (SortField::Title, SortOrder::Asc) => "ORDER BY LOWER(t.title) ASC, t.created_at DESC",
        (SortField::Title, SortOrder::Desc) => "ORDER BY LOWER(t.title) DESC, t.created_at DESC",
        (SortField::CreatedAt, SortOrder::Asc) => "ORDER BY t.created_at ASC",
        (SortField::CreatedAt, SortOrder::Desc) => "ORDER BY t.created_at DESC",
    }
}

/// Ensures every tag exists for the owner and replaces the task's
/// association set with exactly the given set.
async fn bind_tags(
    tx: &mut Transaction<'_, Postgres>,
    owner: &UserId,
    task_id: TaskId,
    tags: &[TagName],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM task_tags WHERE task_id = $1")
        .bind(task_id.as_uuid())
        .execute(&mut **tx)
        .await?;

    for tag in tags {
        // Concurrent creation of the same (owner, name) resolves to the
        // existing row; "already exists" is success.
        let tag_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO tags (id, owner_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_id, name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(TagId::new().as_uuid())
        .bind(owner.as_str())
        .bind(tag.as_str())
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            "INSERT INTO task_tags (task_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(task_id.as_uuid())
        .bind(tag_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

fn row_to_task(row: &PgRow) -> Result<Task, RepoError> {
    let id: Uuid = row.try_get("id")?;
    let owner_id: String = row.try_get("owner_id")?;
    let title: String = row.try_get("title")?;
    let description: Option<String> = row.try_get("description")?;
    let completed: bool = row.try_get("completed")?;
    let priority_str: String = row.try_get("priority")?;
    let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at")?;
    let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("updated_at")?;
    let tag_names: Vec<String> = row.try_get("tags")?;

    let priority = Priority::parse(&priority_str).ok_or_else(|| {
        tracing::error!("Unknown priority value in storage: {}", priority_str);
        RepoError::Domain(ToolError::internal("Storage operation failed"))
    })?;

    let owner = UserId::new(owner_id).map_err(|_| {
        tracing::error!("Empty owner_id in storage for task {}", id);
        RepoError::Domain(ToolError::internal("Storage operation failed"))
    })?;

    let tags = tag_names.into_iter().map(TagName::reconstitute).collect();

    Ok(Task::reconstitute(
        TaskId::from_uuid(id),
        owner,
        title,
        description,
        completed,
        priority,
        tags,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}

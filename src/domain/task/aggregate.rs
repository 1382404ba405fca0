//! Task aggregate entity.
//!
//! A task is owned by exactly one user for its entire lifetime. The
//! aggregate enforces the field invariants; tenant scoping is enforced by
//! the repository on every access.
//!
//! # Invariants
//!
//! - `owner_id` never changes
//! - `title` is 1-200 characters after trim, never whitespace-only
//! - `tags` is duplicate-free with at most 20 elements
//! - `created_at` is immutable; `updated_at >= created_at` and is bumped on
//!   every successful mutation

use crate::domain::foundation::{TaskId, Timestamp, ToolError, UserId};

use super::priority::Priority;
use super::tag::{TagName, MAX_TAGS_PER_TASK};

/// Maximum length for a task title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length for a task description.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Field-wise patch for `update_task`.
///
/// Absent field = no change. A present, empty tag list clears all tags; a
/// present, empty description clears the description.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<TagName>>,
}

impl TaskPatch {
    /// Returns true when no field is present.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
    }
}

/// Task aggregate - the unit of ownership and mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    owner_id: UserId,
    title: String,
    description: Option<String>,
    completed: bool,
    priority: Priority,
    tags: Vec<TagName>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Task {
    /// Creates a new pending task.
    ///
    /// # Errors
    ///
    /// `validation` when the title or tag set violates an invariant.
    pub fn new(
        id: TaskId,
        owner_id: UserId,
        title: String,
        description: Option<String>,
        priority: Priority,
        tags: Vec<TagName>,
    ) -> Result<Self, ToolError> {
        let title = Self::validate_title(&title)?;
        let description = Self::validate_description(description)?;
        Self::validate_tags(&tags)?;

        let now = Timestamp::now();
        Ok(Self {
            id,
            owner_id,
            title,
            description,
            completed: false,
            priority,
            tags,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a task from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: TaskId,
        owner_id: UserId,
        title: String,
        description: Option<String>,
        completed: bool,
        priority: Priority,
        tags: Vec<TagName>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            owner_id,
            title,
            description,
            completed,
            priority,
            tags,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the task ID.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owner's user ID.
    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the task is completed.
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Returns the priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the tag set, sorted and duplicate-free.
    pub fn tags(&self) -> &[TagName] {
        &self.tags
    }

    /// Returns when the task was created.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the task was last mutated.
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Checks if the given user owns this task.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Applies a field-wise patch and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// `validation` when the patch is empty or a patched field violates an
    /// invariant. The task is unchanged on error.
    pub fn apply(&mut self, patch: TaskPatch) -> Result<(), ToolError> {
        if patch.is_empty() {
            return Err(ToolError::validation(
                "fields",
                "At least one field is required: title, description, priority, or tags",
            ));
        }

        let title = match patch.title {
            Some(raw) => Some(Self::validate_title(&raw)?),
            None => None,
        };
        let description = match patch.description {
            Some(raw) => Some(Self::validate_description(raw)?),
            None => None,
        };
        if let Some(tags) = &patch.tags {
            Self::validate_tags(tags)?;
        }

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Flips the completion flag, bumps `updated_at`, returns the new value.
    pub fn toggle_completed(&mut self) -> bool {
        self.completed = !self.completed;
        self.updated_at = Timestamp::now();
        self.completed
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn validate_title(title: &str) -> Result<String, ToolError> {
        let trimmed = title.trim();
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

    fn validate_description(description: Option<String>) -> Result<Option<String>, ToolError> {
        match description {
            None => Ok(None),
            Some(raw) => {
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
        }
    }

    fn validate_tags(tags: &[TagName]) -> Result<(), ToolError> {
        if tags.len() > MAX_TAGS_PER_TASK {
            return Err(ToolError::validation(
                "tags",
                format!("A task can have at most {} tags", MAX_TAGS_PER_TASK),
            ));
        }
        Ok(())
    }
}

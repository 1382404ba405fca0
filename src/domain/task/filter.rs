//! List filtering and sorting semantics.
//!
//! These types define the `list_tasks` query surface once, so the Postgres
//! adapter can compile them to SQL and the in-memory adapter can evaluate
//! them directly with identical results.

use std::cmp::Ordering;

use super::aggregate::Task;
use super::priority::Priority;
use super::tag::TagName;

/// Completion filter for `list_tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    /// Parses a wire value; `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(StatusFilter::All),
            "pending" => Some(StatusFilter::Pending),
            "completed" => Some(StatusFilter::Completed),
            _ => None,
        }
    }
}

/// Priority filter for `list_tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityFilter {
    #[default]
    All,
    Exact(Priority),
}

impl PriorityFilter {
    /// Parses a wire value; `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        if s == "all" {
            return Some(PriorityFilter::All);
        }
        Priority::parse(s).map(PriorityFilter::Exact)
    }
}

/// Combined filter for a scoped list query.
///
/// Owner scoping is applied by the repository and is not part of this type.
/// When `no_tags` is set it takes precedence over `tags`.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub priority: PriorityFilter,
    pub tags: Vec<TagName>,
    pub no_tags: bool,
    pub search: Option<String>,
}

impl TaskFilter {
    /// Evaluates the filter against a task.
    pub fn matches(&self, task: &Task) -> bool {
        match self.status {
            StatusFilter::All => {}
            StatusFilter::Pending => {
                if task.completed() {
                    return false;
                }
            }
            StatusFilter::Completed => {
                if !task.completed() {
                    return false;
                }
            }
        }

        if let PriorityFilter::Exact(p) = self.priority {
            if task.priority() != p {
                return false;
            }
        }

        if self.no_tags {
            if !task.tags().is_empty() {
                return false;
            }
        } else if !self.tags.is_empty() {
            // OR semantics: any named tag qualifies.
            let has_any = self.tags.iter().any(|t| task.tags().contains(t));
            if !has_any {
                return false;
            }
        }

        if let Some(query) = &self.search {
            let needle = query.to_lowercase();
            let in_title = task.title().to_lowercase().contains(&needle);
            let in_description = task
                .description()
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_title && !in_description {
                return false;
            }
        }

        true
    }
}

/// Sortable field for `list_tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Priority,
    Title,
    #[default]
    CreatedAt,
}

impl SortField {
    /// Parses a wire value; `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "priority" => Some(SortField::Priority),
            "title" => Some(SortField::Title),
            "created_at" => Some(SortField::CreatedAt),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parses a wire value; `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Sort specification. Default is newest-first by creation time.
///
/// For `priority`, `asc` means highest-first (high > medium > low > none),
/// the convention the consuming UI relies on. Priority and title ties break
/// by `created_at` descending; `created_at` has no secondary key.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl TaskSort {
    /// Total order over tasks for in-memory evaluation.
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self.field {
            SortField::Priority => {
                // asc = highest rank first.
                let primary = match self.order {
                    SortOrder::Asc => b.priority().rank().cmp(&a.priority().rank()),
                    SortOrder::Desc => a.priority().rank().cmp(&b.priority().rank()),
                };
                primary.then_with(|| b.created_at().cmp(&a.created_at()))
            }
            SortField::Title => {
                let (ta, tb) = (a.title().to_lowercase(), b.title().to_lowercase());
                let primary = match self.order {
                    SortOrder::Asc => ta.cmp(&tb),
                    SortOrder::Desc => tb.cmp(&ta),
                };
                primary.then_with(|| b.created_at().cmp(&a.created_at()))
            }
            SortField::CreatedAt => match self.order {
                SortOrder::Asc => a.created_at().cmp(&b.created_at()),
                SortOrder::Desc => b.created_at().cmp(&a.created_at()),
            },
        }
    }
}

//! Task module - the aggregate and its query vocabulary.

mod aggregate;
mod filter;
mod priority;
mod tag;

pub use aggregate::{Task, TaskPatch, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH};
pub use filter::{PriorityFilter, SortField, SortOrder, StatusFilter, TaskFilter, TaskSort};
pub use priority::Priority;
pub use tag::{normalize_set, TagName, MAX_TAGS_PER_TASK, MAX_TAG_LENGTH};

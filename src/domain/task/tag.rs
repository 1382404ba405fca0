//! Tag name value object and normalization.
//!
//! Tags form a per-user vocabulary. A name is stored lowercase, as a single
//! word, 1-50 characters; `(owner_id, name)` is unique in persistence. Rows
//! are created lazily on first use and never removed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::foundation::ToolError;

/// Maximum length of a single tag name.
pub const MAX_TAG_LENGTH: usize = 50;

/// Maximum number of tags bound to one task.
pub const MAX_TAGS_PER_TASK: usize = 20;

/// A normalized tag name: lowercase, single word, 1-50 characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagName(String);

impl TagName {
    /// Normalizes a raw tag name: trim, lowercase, then validate.
    ///
    /// # Errors
    ///
    /// `validation` when the result is empty, longer than
    /// [`MAX_TAG_LENGTH`], or contains whitespace.
    pub fn normalize(raw: &str) -> Result<Self, ToolError> {
        let name = raw.trim().to_lowercase();
        if name.is_empty() {
            return Err(ToolError::validation("tags", "Tag name cannot be empty"));
        }
        if name.chars().count() > MAX_TAG_LENGTH {
            return Err(ToolError::validation(
                "tags",
                format!("Tag name must be {} characters or less", MAX_TAG_LENGTH),
            ));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(ToolError::validation(
                "tags",
                format!("Tag name '{}' must be a single word", name),
            ));
        }
        Ok(Self(name))
    }

    /// Rebuilds a tag name from persistence without re-validation.
    pub fn reconstitute(name: String) -> Self {
        Self(name)
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalizes a list of raw names into a duplicate-free, sorted tag set.
///
/// # Errors
///
/// `validation` when any element fails the tag constraint or the
/// deduplicated set exceeds [`MAX_TAGS_PER_TASK`].
pub fn normalize_set(raw: &[String]) -> Result<Vec<TagName>, ToolError> {
    let mut set = BTreeSet::new();
    for name in raw {
        set.insert(TagName::normalize(name)?);
    }
    if set.len() > MAX_TAGS_PER_TASK {
        return Err(ToolError::validation(
            "tags",
            format!("A task can have at most {} tags", MAX_TAGS_PER_TASK),
        ));
    }
    Ok(set.into_iter().collect())
}

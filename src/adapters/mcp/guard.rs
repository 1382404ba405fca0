//! Authorization guard - one predicate, applied before every state access.
//!
//! The verified subject must equal the `user_id` argument. Ownership of a
//! specific task is the repository's concern: a foreign task reads as
//! absent there, so cross-tenant probes surface `not_found`, never
//! `unauthorized`, and identifiers cannot be enumerated across tenants.

use crate::domain::foundation::{Subject, ToolError, UserId};

/// Asserts that the credential subject matches the claimed user.
pub fn ensure_subject_matches(subject: &Subject, user_id: &UserId) -> Result<(), ToolError> {
    if subject.user_id() == user_id {
        Ok(())
    } else {
        Err(ToolError::unauthorized(
            "user_id does not match the authenticated subject",
        ))
    }
}

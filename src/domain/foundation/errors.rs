//! Error types for the domain layer.
//!
//! Every failure a tool call can surface belongs to the closed taxonomy in
//! [`ErrorType`]. Internal causes (database failures, timeouts) are logged
//! with full detail but reach the caller only as a short, user-safe message.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use serde::Serialize;

/// Closed taxonomy of tool-call failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Parameter schema violation, cross-field rule violation, unknown tool
    /// name, or unknown enum value. Not retryable; fix the input.
    Validation,

    /// Missing/invalid/expired credential, or credential subject does not
    /// match the claimed user. Not retryable; re-authenticate.
    Unauthorized,

    /// Task does not exist, or exists but belongs to a different subject.
    NotFound,

    /// Storage failure after retries, deadline exceeded, or unexpected
    /// failure. Retryable by the caller after backoff.
    Internal,
}

impl ErrorType {
    /// Returns the wire representation of this error type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Validation => "validation",
            ErrorType::Unauthorized => "unauthorized",
            ErrorType::NotFound => "not_found",
            ErrorType::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured tool failure with type, message, and optional field details.
///
/// This is both the internal error currency and the wire DTO rendered into
/// error envelopes. Messages must stay short and actionable; identifiers
/// other than those the caller supplied, SQL text, and stack traces never
/// appear here.
#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub error_type: ErrorType,
    pub message: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, String>,
}

impl ToolError {
    /// Creates an error of the given type.
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorType::Validation, message).with_detail("field", field)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorType::Unauthorized, message)
    }

    /// Creates a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorType::NotFound, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorType::Internal, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns true if the caller may retry after backoff.
    pub fn is_retryable(&self) -> bool {
        self.error_type == ErrorType::Internal
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_type, self.message)
    }
}

impl Error for ToolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_type_wire_names_are_snake_case() {
        assert_eq!(ErrorType::Validation.as_str(), "validation");
        assert_eq!(ErrorType::Unauthorized.as_str(), "unauthorized");
        assert_eq!(ErrorType::NotFound.as_str(), "not_found");
        assert_eq!(ErrorType::Internal.as_str(), "internal");
    }

    #[test]
    fn validation_error_carries_field_detail() {
        let err = ToolError::validation("title", "Title cannot be empty");
        assert_eq!(err.error_type, ErrorType::Validation);
        assert_eq!(err.details.get("field"), Some(&"title".to_string()));
    }

    #[test]
    fn only_internal_is_retryable() {
        assert!(ToolError::internal("boom").is_retryable());
        assert!(!ToolError::validation("f", "bad").is_retryable());
        assert!(!ToolError::unauthorized("no").is_retryable());
        assert!(!ToolError::not_found("gone").is_retryable());
    }

    #[test]
    fn displays_type_and_message() {
        let err = ToolError::not_found("Task not found");
        assert_eq!(format!("{}", err), "[not_found] Task not found");
    }

    #[test]
    fn serializes_error_type_as_snake_case() {
        let err = ToolError::not_found("Task not found");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error_type"], "not_found");
        assert_eq!(json["message"], "Task not found");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn serializes_details_when_present() {
        let err = ToolError::validation("title", "Title cannot be empty");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["details"]["field"], "title");
    }
}

//! Authentication types for the domain layer.
//!
//! A verified credential reduces to a single [`Subject`]: the user on whose
//! behalf the tool call executes. No other claim influences authorization.
//! Any token verifier (static key, JWKS-backed provider) populates these
//! types via the `TokenVerifier` port.

use thiserror::Error;

use super::{ToolError, UserId};

/// The authenticated principal extracted from a verified credential.
///
/// Equal to the `user_id` argument of every tool call in this system; the
/// authorization guard reconciles the two on each invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject(UserId);

impl Subject {
    /// Creates a subject from a raw subject claim.
    ///
    /// # Errors
    ///
    /// Fails when the claim is empty after trim.
    pub fn new(sub: impl Into<String>) -> Result<Self, ToolError> {
        Ok(Self(UserId::new(sub)?))
    }

    /// Returns the subject as a user id.
    pub fn user_id(&self) -> &UserId {
        &self.0
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credential verification failures.
///
/// Provider-agnostic: these describe what went wrong from the service's
/// perspective, not the identity provider's.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The credential is missing, malformed, unsigned by the configured
    /// issuer, or lacks a subject claim.
    #[error("Invalid token")]
    InvalidToken,

    /// The credential has expired (beyond skew tolerance).
    #[error("Token expired")]
    TokenExpired,

    /// The verification key source is unavailable (network, config).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}

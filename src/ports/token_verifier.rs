//! Token verifier port.
//!
//! Defines the contract for turning a bearer credential into a verified
//! [`Subject`]. Implementations decide the signature scheme and key source;
//! the rest of the service only sees the subject claim.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, Subject};

/// Port for credential verification.
///
/// Implementations must:
/// - verify the signature against the configured issuer's keys
/// - check expiry and not-before with at most 60 seconds of skew tolerance
/// - derive the subject from the standard `sub` claim and nothing else
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verifies a bearer token and extracts the subject.
    ///
    /// # Errors
    ///
    /// - `InvalidToken` for malformed, unsigned, or subject-less tokens
    /// - `TokenExpired` past the skew tolerance
    /// - `ServiceUnavailable` when the key source cannot be reached
    async fn verify(&self, token: &str) -> Result<Subject, AuthError>;
}

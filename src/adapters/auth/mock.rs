//! Mock token verifier for testing.
//!
//! Implements the `TokenVerifier` port with a fixed token-to-subject map,
//! avoiding the need for a real identity provider in tests.
//!
//! # Example
//!
//! ```ignore
//! use taskdeck::adapters::auth::MockTokenVerifier;
//!
//! let verifier = MockTokenVerifier::new().with_subject("tok-u1", "u1");
//! let subject = verifier.verify("tok-u1").await?;
//! assert_eq!(subject.as_str(), "u1");
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, Subject};
use crate::ports::TokenVerifier;

/// Mock verifier backed by a token-to-subject map.
///
/// Tokens not in the map return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockTokenVerifier {
    subjects: RwLock<HashMap<String, String>>,
    force_error: RwLock<Option<AuthError>>,
}

impl MockTokenVerifier {
    /// Creates a new empty mock verifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token that maps to a subject.
    pub fn with_subject(self, token: impl Into<String>, subject: impl Into<String>) -> Self {
        self.subjects
            .write()
            .unwrap()
            .insert(token.into(), subject.into());
        self
    }

    /// Forces all verifications to return the specified error.
    pub fn with_error(self, error: AuthError) -> Self {
        *self.force_error.write().unwrap() = Some(error);
        self
    }
}

#[async_trait]
impl TokenVerifier for MockTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Subject, AuthError> {
        if let Some(error) = self.force_error.read().unwrap().clone() {
            return Err(error);
        }

        let subjects = self.subjects.read().unwrap();
        match subjects.get(token) {
            Some(subject) => Subject::new(subject.clone()).map_err(|_| AuthError::InvalidToken),
            None => Err(AuthError::InvalidToken),
        }
    }
}

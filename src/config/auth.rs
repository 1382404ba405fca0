//! Authentication configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Authentication configuration (JWT verification)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    /// Expected token issuer
    #[serde(default)]
    pub issuer: String,

    /// Expected audience for tokens; audience checking is skipped when unset
    #[serde(default)]
    pub audience: Option<String>,

    /// Static RSA public key in PEM form
    #[serde(default)]
    pub verification_key_pem: Option<String>,

    /// JWKS endpoint of the identity provider
    #[serde(default)]
    pub jwks_url: Option<String>,

    /// JWKS cache TTL in seconds
    #[serde(default = "default_jwks_cache_ttl")]
    pub jwks_cache_ttl_secs: u64,
}

impl AuthConfig {
    /// Get JWKS cache TTL as Duration
    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_secs)
    }

    /// Validate authentication configuration
    ///
    /// Requires an issuer and exactly one key source. In production the
    /// issuer must use HTTPS.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.issuer.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH_ISSUER"));
        }

        match (&self.verification_key_pem, &self.jwks_url) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => return Err(ValidationError::AmbiguousKeySource),
        }

        if *environment == Environment::Production && !self.issuer.starts_with("https://") {
            return Err(ValidationError::IssuerMustBeHttps);
        }

        Ok(())
    }
}

fn default_jwks_cache_ttl() -> u64 {
    3600
}

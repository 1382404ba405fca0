//! JWT adapter for bearer credential verification.
//!
//! Implements the `TokenVerifier` port with `jsonwebtoken`. Two key sources
//! are supported:
//!
//! 1. A static RSA public key in PEM form, loaded once at startup
//! 2. A JWKS URL, fetched with reqwest and cached with a fixed TTL
//!
//! Verification checks the signature, the issuer claim, the optional
//! audience claim, and expiry/not-before with a 60-second skew tolerance.
//! The subject is taken from the standard `sub` claim; no other claim
//! influences authorization.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{
    decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, TokenData, Validation,
};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::foundation::{AuthError, Subject};
use crate::ports::TokenVerifier;

/// Skew tolerance applied to `exp` and `nbf` checks.
const CLOCK_SKEW_LEEWAY_SECS: u64 = 60;

/// Where the verification key material comes from.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// RSA public key in PEM form, loaded once at startup.
    RsaPem(String),
    /// JWKS endpoint of the identity provider.
    JwksUrl(String),
}

/// Configuration for the JWT verifier.
#[derive(Debug, Clone)]
pub struct JwtVerifierConfig {
    /// Expected `iss` claim.
    pub issuer: String,

    /// Expected `aud` claim; audience checking is skipped when absent.
    pub audience: Option<String>,

    /// Verification key material.
    pub key_source: KeySource,

    /// How long to cache a fetched JWKS before refetching. Defaults to
    /// 1 hour. Irrelevant for the PEM source.
    pub jwks_cache_ttl: Option<Duration>,
}

/// Claims this service reads from a token.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    iss: String,
    #[allow(dead_code)]
    exp: i64,
}

/// Cached JWKS with expiry tracking.
struct JwksCache {
    jwks: JwkSet,
    fetched_at: Instant,
    cache_ttl: Duration,
}

impl JwksCache {
    fn new(jwks: JwkSet, cache_ttl: Duration) -> Self {
        Self {
            jwks,
            fetched_at: Instant::now(),
            cache_ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.fetched_at.elapsed() > self.cache_ttl
    }
}

/// Production implementation of `TokenVerifier`.
pub struct JwtVerifier {
    config: JwtVerifierConfig,
    http_client: reqwest::Client,
    static_key: Option<DecodingKey>,
    jwks_cache: Arc<RwLock<Option<JwksCache>>>,
}

impl JwtVerifier {
    /// Creates a verifier, building the static key eagerly when configured
    /// with a PEM source.
    ///
    /// # Errors
    ///
    /// `ServiceUnavailable` when the configured PEM key cannot be parsed.
    pub fn new(config: JwtVerifierConfig) -> Result<Self, AuthError> {
        let static_key = match &config.key_source {
            KeySource::RsaPem(pem) => Some(DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(
                |e| {
                    tracing::error!("Failed to parse verification key: {}", e);
                    AuthError::service_unavailable("Invalid verification key")
                },
            )?),
            KeySource::JwksUrl(_) => None,
        };

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::service_unavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            static_key,
            jwks_cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Fetch JWKS from the identity provider.
    async fn fetch_jwks(&self, url: &str) -> Result<JwkSet, AuthError> {
        tracing::debug!("Fetching JWKS from {}", url);

        let response = self.http_client.get(url).send().await.map_err(|e| {
            tracing::error!("Failed to fetch JWKS: {}", e);
            AuthError::service_unavailable("Failed to fetch JWKS")
        })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("JWKS endpoint returned {}", status);
            return Err(AuthError::service_unavailable(format!(
                "JWKS endpoint returned {}",
                status
            )));
        }

        let jwks: JwkSet = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse JWKS: {}", e);
            AuthError::service_unavailable("Failed to parse JWKS")
        })?;

        Ok(jwks)
    }

    /// Get JWKS, using cache if available and not expired.
    async fn get_jwks(&self, url: &str) -> Result<JwkSet, AuthError> {
        {
            let cache = self.jwks_cache.read().await;
            if let Some(ref cached) = *cache {
                if !cached.is_expired() {
                    return Ok(cached.jwks.clone());
                }
            }
        }

        let jwks = self.fetch_jwks(url).await?;

        {
            let mut cache = self.jwks_cache.write().await;
            let ttl = self
                .config
                .jwks_cache_ttl
                .unwrap_or(Duration::from_secs(3600));
            *cache = Some(JwksCache::new(jwks.clone(), ttl));
        }

        Ok(jwks)
    }

    /// Find the decoding key matching the token's `kid` header.
    fn find_jwks_key(
        &self,
        header: &jsonwebtoken::Header,
        jwks: &JwkSet,
    ) -> Result<(DecodingKey, Algorithm), AuthError> {
        let kid = header.kid.as_ref().ok_or_else(|| {
            tracing::warn!("JWT missing 'kid' header");
            AuthError::InvalidToken
        })?;

        let jwk = jwks.find(kid).ok_or_else(|| {
            tracing::warn!("No matching key found for kid: {}", kid);
            AuthError::InvalidToken
        })?;

        let algorithm = match jwk.common.key_algorithm {
            Some(jsonwebtoken::jwk::KeyAlgorithm::RS256) => Algorithm::RS256,
            Some(jsonwebtoken::jwk::KeyAlgorithm::RS384) => Algorithm::RS384,
            Some(jsonwebtoken::jwk::KeyAlgorithm::RS512) => Algorithm::RS512,
            Some(jsonwebtoken::jwk::KeyAlgorithm::ES256) => Algorithm::ES256,
            Some(jsonwebtoken::jwk::KeyAlgorithm::ES384) => Algorithm::ES384,
            Some(other) => {
                tracing::warn!("Unsupported algorithm: {:?}", other);
                return Err(AuthError::InvalidToken);
            }
            None => Algorithm::RS256,
        };

        let decoding_key = DecodingKey::from_jwk(jwk).map_err(|e| {
            tracing::warn!("Failed to create decoding key: {}", e);
            AuthError::InvalidToken
        })?;

        Ok((decoding_key, algorithm))
    }

    /// Algorithm for the static PEM path; RSA family only.
    fn static_algorithm(header: &jsonwebtoken::Header) -> Result<Algorithm, AuthError> {
        match header.alg {
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => Ok(header.alg),
            other => {
                tracing::warn!("Unsupported algorithm for static key: {:?}", other);
                Err(AuthError::InvalidToken)
            }
        }
    }

    /// Validate signature and registered claims.
    fn validate_token(
        &self,
        token: &str,
        decoding_key: &DecodingKey,
        algorithm: Algorithm,
    ) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY_SECS;
        validation.set_issuer(&[&self.config.issuer]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        match &self.config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        decode::<Claims>(token, decoding_key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                ErrorKind::InvalidIssuer => {
                    tracing::warn!("Invalid issuer in token");
                    AuthError::InvalidToken
                }
                ErrorKind::InvalidAudience => {
                    tracing::warn!("Invalid audience in token");
                    AuthError::InvalidToken
                }
                _ => {
                    tracing::warn!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            }
        })
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Subject, AuthError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!("Failed to decode JWT header: {}", e);
            AuthError::InvalidToken
        })?;

        let (decoding_key, algorithm) = match (&self.static_key, &self.config.key_source) {
            (Some(key), _) => (key.clone(), Self::static_algorithm(&header)?),
            (None, KeySource::JwksUrl(url)) => {
                let jwks = self.get_jwks(url).await?;
                self.find_jwks_key(&header, &jwks)?
            }
            (None, KeySource::RsaPem(_)) => {
                // Construction guarantees a static key for the PEM source.
                return Err(AuthError::service_unavailable("Verifier misconfigured"));
            }
        };

        let token_data = self.validate_token(token, &decoding_key, algorithm)?;
        let claims = token_data.claims;

        // Defense in depth: re-check issuer after library validation.
        if claims.iss != self.config.issuer {
            tracing::warn!(
                "Issuer mismatch after validation: expected '{}', got '{}'",
                self.config.issuer,
                claims.iss
            );
            return Err(AuthError::InvalidToken);
        }

        Subject::new(claims.sub).map_err(|_| {
            tracing::warn!("Token carries an empty subject claim");
            AuthError::InvalidToken
        })
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

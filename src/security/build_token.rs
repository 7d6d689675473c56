//! Build token verification.
//!
//! A build token is a short-lived HS256 JWT binding a calling origin to one
//! resource spec. Holding a valid token exempts the caller from rate
//! limiting for that spec, so verification checks all three bindings:
//! signature, audience (the raw spec), and origin.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::header::{HeaderMap, HOST, ORIGIN};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by a build token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildTokenClaims {
    /// The resource spec this token is bound to.
    pub aud: String,
    /// Origin the token was issued for, host[:port] form.
    pub origin: String,
    /// Issued-at, seconds since epoch.
    pub iat: u64,
    /// Expiry, seconds since epoch.
    pub exp: u64,
}

/// A present-but-invalid build token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("build token failed verification: {0}")]
    Verification(#[from] jsonwebtoken::errors::Error),

    #[error("build token origin {claimed:?} does not match request origin {computed:?}")]
    OriginMismatch { claimed: String, computed: String },
}

/// Verifies (and issues) build tokens against a shared secret.
pub struct BuildTokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires: Duration,
    check_origin: bool,
}

impl BuildTokenVerifier {
    pub fn new(secret: &str, expires: Duration, check_origin: bool) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires,
            check_origin,
        }
    }

    /// Issue a token binding `origin` to `spec`.
    pub fn issue(&self, spec: &str, origin: &str) -> Result<String, TokenError> {
        let now = unix_now();
        let claims = BuildTokenClaims {
            aud: spec.to_string(),
            origin: origin.to_string(),
            iat: now,
            exp: now + self.expires.as_secs(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Verify an optional token against the requested spec and the computed
    /// request origin.
    ///
    /// An absent token is not an error: the request simply proceeds without
    /// build-token privileges. A present token must carry a valid HS256
    /// signature, an audience equal to `spec`, and an unexpired lifetime.
    /// An origin mismatch is always logged at error level; it only rejects
    /// the token when origin checking is enabled.
    pub fn verify(
        &self,
        token: Option<&str>,
        spec: &str,
        origin: &str,
    ) -> Result<Option<BuildTokenClaims>, TokenError> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(None),
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[spec]);

        let claims = match jsonwebtoken::decode::<BuildTokenClaims>(
            token,
            &self.decoding_key,
            &validation,
        ) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::warn!(spec = %spec, error = %e, "Build token failed verification");
                return Err(TokenError::Verification(e));
            }
        };

        if claims.origin != origin {
            // Log loudly, reject only if configured.
            tracing::error!(
                spec = %spec,
                claimed_origin = %claims.origin,
                request_origin = %origin,
                "Build token origin mismatch"
            );
            if self.check_origin {
                return Err(TokenError::OriginMismatch {
                    claimed: claims.origin,
                    computed: origin.to_string(),
                });
            }
        }

        Ok(Some(claims))
    }
}

/// Compute the request origin: the `Origin` header with its scheme
/// stripped (host[:port] retained), falling back to the `Host` header.
pub fn request_origin(headers: &HeaderMap) -> Option<String> {
    if let Some(origin) = headers.get(ORIGIN).and_then(|v| v.to_str().ok()) {
        let host = origin
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(origin);
        return Some(host.to_string());
    }
    headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(|h| h.to_string())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

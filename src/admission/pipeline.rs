//! The per-request admission state machine.
//!
//! Checks run in a fixed order: network block list first (cheapest, no
//! crypto), then identity, then build token, then rate limiting. Identity
//! precedes the token and rate steps because both key their bypass
//! decisions on it; the token check precedes rate limiting because a valid
//! token exempts the request from counting.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::HeaderMap;
use thiserror::Error;

use crate::admission::identity::{Identity, IdentityResolver, NullResolver, TrustedHeaderResolver};
use crate::config::GateConfig;
use crate::observability::metrics;
use crate::security::block_list::BlockListError;
use crate::security::{
    request_origin, BuildTokenVerifier, NetworkBlockList, RateLimitInfo, RateLimiter, TokenError,
};

/// Header carrying the build token when it is not a query parameter.
pub const BUILD_TOKEN_HEADER: &str = "x-build-token";

/// Query parameter carrying the build token.
pub const BUILD_TOKEN_PARAM: &str = "build_token";

/// The request attributes the pipeline consumes, borrowed for one request.
pub struct AdmissionRequest<'a> {
    pub remote_ip: IpAddr,
    pub headers: &'a HeaderMap,
    /// Raw request path, never percent-decoded.
    pub path: &'a str,
    pub query: Option<&'a str>,
    /// Explicit opt-out of the network check for enumerated endpoints.
    pub skip_network_check: bool,
}

/// What an admitted request carries into business logic.
#[derive(Debug, Clone)]
pub struct Admission {
    /// Resolved identity; `None` means auth is enabled but the request is
    /// unauthenticated (the login flow lives upstream of the gate).
    pub identity: Option<Identity>,
    pub has_valid_build_token: bool,
    /// Present when the rate limiter counted this request.
    pub rate_limit: Option<RateLimitInfo>,
}

/// Terminal rejection states of the pipeline.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Requests from {message} are not allowed")]
    NetworkBlocked { message: String },

    #[error("Invalid build token")]
    InvalidToken(#[from] TokenError),

    #[error("Rate limit exceeded. Try again in {} minutes", .period_secs / 60)]
    RateLimitExceeded {
        retry_after_secs: u64,
        period_secs: u64,
        limit: u64,
    },
}

/// Fixed-order composition of the three checks plus identity resolution.
pub struct AdmissionPipeline {
    block_list: NetworkBlockList,
    verifier: BuildTokenVerifier,
    limiter: RateLimiter,
    resolver: Arc<dyn IdentityResolver>,
    auth_enabled: bool,
    spec_prefix: String,
}

impl AdmissionPipeline {
    /// Build the pipeline from validated configuration.
    pub fn from_config(config: &GateConfig) -> Result<Self, BlockListError> {
        let resolver: Arc<dyn IdentityResolver> = if config.auth.enabled {
            match config.auth.user_header.parse() {
                Ok(header) => Arc::new(TrustedHeaderResolver::new(header)),
                Err(_) => {
                    tracing::error!(
                        header = %config.auth.user_header,
                        "Invalid auth user header name, identities will not resolve"
                    );
                    Arc::new(NullResolver)
                }
            }
        } else {
            Arc::new(NullResolver)
        };

        Ok(Self {
            block_list: NetworkBlockList::from_config(
                &config.ban_networks,
                config.ban_networks_min_prefix_len,
            )?,
            verifier: BuildTokenVerifier::new(
                &config.build_token.secret,
                std::time::Duration::from_secs(config.build_token.expires_secs),
                config.build_token.check_origin,
            ),
            limiter: RateLimiter::new(
                config.rate_limit.limit,
                std::time::Duration::from_secs(config.rate_limit.period_secs),
            ),
            resolver,
            auth_enabled: config.auth.enabled,
            spec_prefix: config.build_token.spec_prefix.clone(),
        })
    }

    /// Swap the identity collaborator (the default is chosen by config).
    pub fn with_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// The token verifier, exposed so trusted surfaces can mint tokens.
    pub fn verifier(&self) -> &BuildTokenVerifier {
        &self.verifier
    }

    /// Run every check against one request.
    pub fn admit(&self, request: &AdmissionRequest<'_>) -> Result<Admission, AdmissionError> {
        // 1. Network block list.
        if !request.skip_network_check {
            if let Some(rule) = self.block_list.match_ip(request.remote_ip) {
                tracing::warn!(
                    client = %request.remote_ip,
                    network = %rule.network,
                    message = %rule.message,
                    "Blocking request from banned network"
                );
                metrics::record_admission("network_blocked");
                return Err(AdmissionError::NetworkBlocked {
                    message: rule.message.clone(),
                });
            }
        }

        // 2. Identity. The collaborator is consulted first even with auth
        // disabled, so capability-token identities still resolve.
        let identity = self
            .resolver
            .resolve(request.headers)
            .or_else(|| (!self.auth_enabled).then_some(Identity::Anonymous));

        // 3. Build token, bound to the raw spec in the path.
        let has_valid_build_token = self.check_build_token(request)?;

        // 4. Rate limit, unless something upstream vouched for the caller.
        let authenticated = self.auth_enabled
            && matches!(identity, Some(Identity::User(_)));
        let rate_limit = if self.limiter.is_disabled() || authenticated || has_valid_build_token {
            None
        } else {
            let key = request.remote_ip.to_string();
            match self.limiter.increment(&key) {
                Ok(info) => Some(info),
                Err(e) => {
                    tracing::warn!(client = %key, retry_after_secs = e.retry_after_secs, "Rate limit exceeded");
                    metrics::record_admission("rate_limited");
                    return Err(AdmissionError::RateLimitExceeded {
                        retry_after_secs: e.retry_after_secs,
                        period_secs: self.limiter.period().as_secs(),
                        limit: self.limiter.limit(),
                    });
                }
            }
        };

        metrics::record_admission("allowed");
        Ok(Admission {
            identity,
            has_valid_build_token,
            rate_limit,
        })
    }

    fn check_build_token(&self, request: &AdmissionRequest<'_>) -> Result<bool, AdmissionError> {
        let token = token_from_request(request.headers, request.query);

        let Some(spec) = spec_from_path(request.path, &self.spec_prefix) else {
            if token.is_some() {
                tracing::debug!(path = %request.path, "Build token supplied on a path without a spec, ignoring");
            }
            return Ok(false);
        };

        let origin = request_origin(request.headers).unwrap_or_default();
        match self.verifier.verify(token.as_deref(), spec, &origin) {
            Ok(Some(_)) => Ok(true),
            Ok(None) => Ok(false),
            Err(e) => {
                metrics::record_admission("invalid_token");
                Err(AdmissionError::InvalidToken(e))
            }
        }
    }
}

/// Re-extract the resource spec from the raw request path.
///
/// The path is deliberately not percent-decoded: a spec like
/// `gh/owner%2Frepo/main` keeps its encoded separator, which downstream
/// routing depends on. Everything after `<prefix>/` is the spec.
pub fn spec_from_path<'p>(path: &'p str, prefix: &str) -> Option<&'p str> {
    let idx = path.find(prefix)?;
    let rest = path[idx + prefix.len()..].strip_prefix('/')?;
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

fn token_from_request(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key == BUILD_TOKEN_PARAM {
                return Some(value.into_owned());
            }
        }
    }
    headers
        .get(BUILD_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

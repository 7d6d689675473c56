//! Identity resolution.
//!
//! The login flow itself lives outside the gate; the gate only asks "who is
//! this request from, if anyone" and keys its rate-limit bypass decisions
//! on the answer.

use axum::http::header::HeaderName;
use axum::http::HeaderMap;

/// The identity a request carries through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// The fixed sentinel used when authentication is disabled.
    Anonymous,
    /// An authenticated user.
    User(String),
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    pub fn name(&self) -> &str {
        match self {
            Identity::Anonymous => "anonymous",
            Identity::User(name) => name,
        }
    }
}

/// External identity collaborator.
///
/// Implementations are a black box to the pipeline: whatever session or
/// token machinery sits upstream, the gate only consumes the resolved
/// identity (or its absence).
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// Resolves the user name from a header injected by a trusted upstream
/// auth layer. The gate must only be reachable through that layer.
pub struct TrustedHeaderResolver {
    header: HeaderName,
}

impl TrustedHeaderResolver {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl IdentityResolver for TrustedHeaderResolver {
    fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
        let name = headers.get(&self.header)?.to_str().ok()?;
        if name.is_empty() {
            return None;
        }
        Some(Identity::User(name.to_string()))
    }
}

/// Resolver that never identifies anyone; used when auth is disabled.
pub struct NullResolver;

impl IdentityResolver for NullResolver {
    fn resolve(&self, _headers: &HeaderMap) -> Option<Identity> {
        None
    }
}

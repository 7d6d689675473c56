//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the admission gate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Banned network ranges checked against every client address.
    pub ban_networks: Vec<BanNetworkConfig>,

    /// Minimum prefix length a ban rule must have to be eligible to match.
    #[serde(default = "default_min_prefix_len")]
    pub ban_networks_min_prefix_len: u8,

    /// Build-token signing and verification settings.
    pub build_token: BuildTokenConfig,

    /// Per-IP rate limiting settings.
    pub rate_limit: RateLimitConfig,

    /// Identity resolution settings.
    pub auth: AuthConfig,

    /// Response header / CORS settings for gated routes.
    pub cors: CorsConfig,

    /// Build backend identity reported by the version endpoint.
    pub builder: BuilderConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8585").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8585".to_string(),
        }
    }
}

/// A single banned network range.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BanNetworkConfig {
    /// Network in CIDR notation (e.g., "10.0.0.0/8").
    pub cidr: String,

    /// Human-readable label returned to blocked clients.
    pub message: String,
}

fn default_min_prefix_len() -> u8 {
    1
}

/// Build-token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildTokenConfig {
    /// Shared HMAC secret for signing and verifying build tokens.
    /// Must be set; an empty secret is a startup error.
    pub secret: String,

    /// Path prefix after which the raw resource spec starts
    /// (e.g., "/build" for paths like "/build/gh/owner%2Frepo/main").
    pub spec_prefix: String,

    /// Token lifetime in seconds when the gate issues tokens itself.
    pub expires_secs: u64,

    /// Reject tokens whose origin claim does not match the request origin.
    /// When false, mismatches are logged but the token is still honored.
    pub check_origin: bool,
}

impl Default for BuildTokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            spec_prefix: "/build".to_string(),
            expires_secs: 300,
            check_origin: true,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum requests per client per window. Zero disables the limiter.
    pub limit: u64,

    /// Window length in seconds.
    pub period_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 0,
            period_secs: 3600,
        }
    }
}

/// Identity resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Whether an external authenticator fronts the gate. When false every
    /// request without a resolved identity is treated as anonymous.
    pub enabled: bool,

    /// Trusted header carrying the authenticated user name, injected by the
    /// upstream auth layer.
    pub user_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            user_header: "x-forwarded-user".to_string(),
        }
    }
}

/// Response header configuration for gated routes.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Hosts allowed to make cross-origin requests. The request Origin is
    /// echoed back only when its host appears here. Empty = never echoed.
    pub allowed_hosts: Vec<String>,

    /// Static headers added to every gated response.
    pub default_headers: HashMap<String, String>,
}

/// Build backend identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Builder image reported by the version endpoint.
    pub image: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            image: "builder:latest".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            ban_networks: Vec::new(),
            ban_networks_min_prefix_len: default_min_prefix_len(),
            build_token: BuildTokenConfig::default(),
            rate_limit: RateLimitConfig::default(),
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
            builder: BuilderConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

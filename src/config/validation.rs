//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Parse every banned CIDR; a malformed block is a startup error
//! - Require a signing secret whenever build tokens can be presented
//! - Validate value ranges (prefix length, rate window)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use ipnet::IpNet;
use thiserror::Error;

use crate::config::schema::GateConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid bind address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("ban network {cidr:?} is not a valid CIDR block: {reason}")]
    InvalidBanNetwork { cidr: String, reason: String },

    #[error("ban network {cidr:?} has prefix length {prefix_len}, below the configured minimum {min_prefix_len}; it could never match")]
    BanNetworkBelowMinPrefix {
        cidr: String,
        prefix_len: u8,
        min_prefix_len: u8,
    },

    #[error("ban_networks_min_prefix_len must be at least 1")]
    ZeroMinPrefixLen,

    #[error("build_token.secret must not be empty")]
    MissingTokenSecret,

    #[error("build_token.spec_prefix {prefix:?} must start with '/'")]
    BadSpecPrefix { prefix: String },

    #[error("rate_limit.period_secs must be positive when rate_limit.limit is set")]
    ZeroRateLimitPeriod,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            address: config.listener.bind_address.clone(),
            reason: "expected host:port".to_string(),
        });
    }

    if config.ban_networks_min_prefix_len == 0 {
        errors.push(ValidationError::ZeroMinPrefixLen);
    }

    for rule in &config.ban_networks {
        match rule.cidr.parse::<IpNet>() {
            Ok(net) => {
                if net.prefix_len() < config.ban_networks_min_prefix_len {
                    errors.push(ValidationError::BanNetworkBelowMinPrefix {
                        cidr: rule.cidr.clone(),
                        prefix_len: net.prefix_len(),
                        min_prefix_len: config.ban_networks_min_prefix_len,
                    });
                }
            }
            Err(e) => errors.push(ValidationError::InvalidBanNetwork {
                cidr: rule.cidr.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if config.build_token.secret.is_empty() {
        errors.push(ValidationError::MissingTokenSecret);
    }

    if !config.build_token.spec_prefix.starts_with('/') {
        errors.push(ValidationError::BadSpecPrefix {
            prefix: config.build_token.spec_prefix.clone(),
        });
    }

    if config.rate_limit.limit > 0 && config.rate_limit.period_secs == 0 {
        errors.push(ValidationError::ZeroRateLimitPeriod);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            address: config.observability.metrics_address.clone(),
            reason: "expected host:port".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BanNetworkConfig;

    fn valid_config() -> GateConfig {
        let mut config = GateConfig::default();
        config.build_token.secret = "test-secret".to_string();
        config
    }

    #[test]
    fn test_default_with_secret_is_valid() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_secret_rejected() {
        let config = GateConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::MissingTokenSecret)));
    }

    #[test]
    fn test_bad_cidr_rejected() {
        let mut config = valid_config();
        config.ban_networks.push(BanNetworkConfig {
            cidr: "10.0.0.0/33".to_string(),
            message: "nope".to_string(),
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::InvalidBanNetwork { .. }));
    }

    #[test]
    fn test_rule_below_min_prefix_rejected() {
        let mut config = valid_config();
        config.ban_networks_min_prefix_len = 16;
        config.ban_networks.push(BanNetworkConfig {
            cidr: "10.0.0.0/8".to_string(),
            message: "cloud".to_string(),
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::BanNetworkBelowMinPrefix { prefix_len: 8, .. }
        ));
    }

    #[test]
    fn test_zero_period_with_limit_rejected() {
        let mut config = valid_config();
        config.rate_limit.limit = 10;
        config.rate_limit.period_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ZeroRateLimitPeriod)));
    }
}

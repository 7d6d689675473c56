//! Network block list with longest-prefix matching.

use std::net::IpAddr;

use ipnet::IpNet;
use thiserror::Error;

use crate::config::BanNetworkConfig;

/// A banned network range and the label reported to blocked clients.
#[derive(Debug, Clone)]
pub struct NetworkRule {
    pub network: IpNet,
    pub message: String,
}

/// Error building a block list from configuration.
#[derive(Debug, Error)]
#[error("invalid ban network {cidr:?}: {source}")]
pub struct BlockListError {
    pub cidr: String,
    #[source]
    pub source: ipnet::AddrParseError,
}

/// Static set of banned network prefixes, immutable after startup.
///
/// Matching is by address containment. When ranges overlap, the rule with
/// the longest prefix (narrowest network) wins. Rules with a prefix shorter
/// than `min_prefix_len` are never consulted.
#[derive(Debug, Default)]
pub struct NetworkBlockList {
    rules: Vec<NetworkRule>,
    min_prefix_len: u8,
}

impl NetworkBlockList {
    /// Build the block list from validated configuration.
    pub fn from_config(
        rules: &[BanNetworkConfig],
        min_prefix_len: u8,
    ) -> Result<Self, BlockListError> {
        let rules = rules
            .iter()
            .map(|rule| {
                rule.cidr
                    .parse::<IpNet>()
                    .map(|network| NetworkRule {
                        network,
                        message: rule.message.clone(),
                    })
                    .map_err(|source| BlockListError {
                        cidr: rule.cidr.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules,
            min_prefix_len,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Return the most specific rule containing `ip`, if any.
    pub fn match_ip(&self, ip: IpAddr) -> Option<&NetworkRule> {
        self.rules
            .iter()
            .filter(|rule| {
                rule.network.prefix_len() >= self.min_prefix_len && rule.network.contains(&ip)
            })
            .max_by_key(|rule| rule.network.prefix_len())
    }

    /// Parse and match a textual address. Malformed addresses never match.
    pub fn match_addr(&self, addr: &str) -> Option<&NetworkRule> {
        match addr.parse::<IpAddr>() {
            Ok(ip) => self.match_ip(ip),
            Err(_) => {
                tracing::debug!(addr = %addr, "Unparseable client address, skipping block list");
                None
            }
        }
    }
}

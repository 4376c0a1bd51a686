//! Configuration validation
//!
//! This module provides validation logic for the configuration to ensure
//! all settings are valid before the server starts.

use anyhow::Result;
use std::collections::HashSet;

use super::types::{Config, PeerConfig};
use crate::protocol::Wildmat;

impl Config {
    /// Validate configuration for correctness
    ///
    /// Most constraints are enforced by the validated types during
    /// deserialization (non-empty names, non-zero ports). This checks the
    /// remaining semantic constraints:
    /// - required authentication implies at least one configured user
    /// - timeouts and intervals are non-zero
    /// - no duplicate peer or seeded group names
    /// - peer group filters compile as wildmats
    pub fn validate(&self) -> Result<()> {
        if !self.auth.anonymous && self.auth.users.is_empty() {
            return Err(anyhow::anyhow!(
                "auth.anonymous = false requires at least one [[auth.users]] entry"
            ));
        }

        if self.session.idle_timeout.is_zero() {
            return Err(anyhow::anyhow!("session.idle_timeout must be non-zero"));
        }
        if self.session.max_command_line < 512 {
            return Err(anyhow::anyhow!(
                "session.max_command_line must be at least 512 octets (RFC 3977 §3.1)"
            ));
        }

        if self.cache.ttl.is_zero() {
            return Err(anyhow::anyhow!("cache.ttl must be non-zero"));
        }
        if let Some(sweep) = self.cache.sweep_interval {
            if sweep.is_zero() {
                return Err(anyhow::anyhow!(
                    "cache.sweep_interval must be non-zero when set"
                ));
            }
        }

        if self.feed.cycle_interval.is_zero() {
            return Err(anyhow::anyhow!("feed.cycle_interval must be non-zero"));
        }
        if self.feed.network_timeout.is_zero() {
            return Err(anyhow::anyhow!("feed.network_timeout must be non-zero"));
        }

        let mut peer_names = HashSet::new();
        for peer in &self.feed.peers {
            if !peer_names.insert(peer.name.as_str()) {
                return Err(anyhow::anyhow!("duplicate peer name '{}'", peer.name));
            }
            validate_peer(peer)?;
        }

        let mut group_names = HashSet::new();
        for group in &self.groups {
            if !group_names.insert(group.name.as_str()) {
                return Err(anyhow::anyhow!("duplicate seeded group '{}'", group.name));
            }
        }

        Ok(())
    }
}

/// Validate a single peer subscription
fn validate_peer(peer: &PeerConfig) -> Result<()> {
    Wildmat::parse(&peer.groups).map_err(|e| {
        anyhow::anyhow!(
            "peer '{}' has an invalid group filter '{}': {}",
            peer.name,
            peer.groups,
            e
        )
    })?;

    if peer.username.is_some() != peer.password.is_some() {
        return Err(anyhow::anyhow!(
            "peer '{}' must set both username and password or neither",
            peer.name
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{AuthConfig, GroupConfig, UserCredentials};
    use crate::storage::FeedDirection;
    use crate::types::{GroupName, HostName, PeerName, Port};

    fn peer(name: &str) -> PeerConfig {
        PeerConfig {
            name: PeerName::new(name).unwrap(),
            host: HostName::new("peer.test").unwrap(),
            port: Port::new(119).unwrap(),
            direction: FeedDirection::Both,
            groups: "*".to_string(),
            username: None,
            password: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_auth_required_without_users_rejected() {
        let mut config = Config::default();
        config.auth = AuthConfig {
            anonymous: false,
            users: Vec::new(),
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("auth.users"));
    }

    #[test]
    fn test_auth_required_with_users_accepted() {
        let mut config = Config::default();
        config.auth = AuthConfig {
            anonymous: false,
            users: vec![UserCredentials {
                username: "reader".to_string(),
                password: "secret".to_string(),
            }],
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_idle_timeout_rejected() {
        let mut config = Config::default();
        config.session.idle_timeout = std::time::Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_short_command_line_limit_rejected() {
        let mut config = Config::default();
        config.session.max_command_line = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_cache_ttl_rejected() {
        let mut config = Config::default();
        config.cache.ttl = std::time::Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_absent_sweep_interval_accepted() {
        let mut config = Config::default();
        config.cache.sweep_interval = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let mut config = Config::default();
        config.cache.sweep_interval = Some(std::time::Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_feed_intervals_rejected() {
        let mut config = Config::default();
        config.feed.cycle_interval = std::time::Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.feed.network_timeout = std::time::Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_peer_names_rejected() {
        let mut config = Config::default();
        config.feed.peers = vec![peer("upstream"), peer("upstream")];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate peer name"));
    }

    #[test]
    fn test_distinct_peer_names_accepted() {
        let mut config = Config::default();
        config.feed.peers = vec![peer("upstream"), peer("downstream")];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_peer_filter_rejected() {
        let mut config = Config::default();
        let mut bad = peer("upstream");
        bad.groups = "comp.*,,".to_string();
        config.feed.peers = vec![bad];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("group filter"));
    }

    #[test]
    fn test_peer_with_username_only_rejected() {
        let mut config = Config::default();
        let mut bad = peer("upstream");
        bad.username = Some("feeduser".to_string());
        config.feed.peers = vec![bad];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("both username and password"));
    }

    #[test]
    fn test_duplicate_seeded_groups_rejected() {
        let mut config = Config::default();
        config.groups = vec![
            GroupConfig {
                name: GroupName::new("local.test").unwrap(),
                posting: true,
            },
            GroupConfig {
                name: GroupName::new("local.test").unwrap(),
                posting: false,
            },
        ];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate seeded group"));
    }
}
